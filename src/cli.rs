// ============================================================================
// MosaicFE CLI - headless region blurring via command-line arguments
// ============================================================================
//
// Usage examples:
//   MosaicFE -i photo.png -r 10,10,40,40                (writes mosaic-image.png next to photo.png)
//   MosaicFE -i photo.jpg -r 0,0,120,60 -r 200,80,50,50 -s 80 -o out.png
//   MosaicFE -i "shots/*.png" -r 20,20,100,30 --output-dir blurred/
//   MosaicFE -i photo.png --surface 760x600 -r 100,100,200,100
//
// No GUI is opened in CLI mode. Each file goes through the same editor the
// window uses, so clamping and minimum-size rules are identical.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use clap::Parser;

use crate::components::selection::SelectionOutcome;
use crate::editor::Editor;
use crate::error::EditorError;
use crate::io::{DEFAULT_EXPORT_NAME, load_image_sync};
use crate::ops::filters::{BlurStrength, DEFAULT_BLUR_STRENGTH};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// MosaicFE headless region blur.
#[derive(Parser, Debug)]
#[command(
    name = "MosaicFE",
    about = "Blur rectangular regions of images without opening the GUI",
    long_about = "Box-blur one or more rectangles of each input image and write the\n\
                  result as PNG. Rectangles are given in image pixels and are clipped\n\
                  to the image.\n\n\
                  Example:\n  \
                  MosaicFE -i photo.png -r 10,10,40,40 -s 70 -o out.png\n  \
                  MosaicFE -i \"*.jpg\" -r 0,0,200,80 --output-dir blurred/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Region to blur as x,y,width,height. Repeat for several regions.
    #[arg(short, long = "region", value_name = "X,Y,W,H")]
    pub regions: Vec<RegionArg>,

    /// Blur strength (0–100, default 50).
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_BLUR_STRENGTH,
        value_name = "0-100",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub strength: u8,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing; files keep their stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Fit the image into a surface of this size (e.g. 760x600) instead of
    /// working at the image's own size.
    #[arg(long, value_name = "WxH")]
    pub surface: Option<SurfaceSize>,

    /// Print per-file timing and region information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// `x,y,width,height` in raster pixels. Negative offsets are allowed and get
/// clipped like a drag that started off the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionArg {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl FromStr for RegionArg {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(EditorError::InvalidRegion(format!(
                "expected x,y,width,height, got '{}'",
                s
            )));
        };
        let num = |v: &str| {
            v.parse::<i64>()
                .map_err(|_| EditorError::InvalidRegion(format!("'{}' is not an integer", v)))
        };
        let region = RegionArg {
            left: num(x)?,
            top: num(y)?,
            width: num(w)?,
            height: num(h)?,
        };
        if region.width < 0 || region.height < 0 {
            return Err(EditorError::InvalidRegion(format!(
                "negative size in '{}'",
                s
            )));
        }
        Ok(region)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for SurfaceSize {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidSurface(format!("expected WIDTHxHEIGHT, got '{}'", s));
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(SurfaceSize { width, height })
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given; use --output-dir to choose where the results go.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let strength = BlurStrength::new(args.strength as i32);
    let total = inputs.len();
    let multi = total > 1;
    let output = if multi { None } else { args.output.as_deref() };
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) =
            build_output_path(input_path, output, args.output_dir.as_deref())
        else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(
            input_path,
            &output_path,
            &args.regions,
            strength,
            args.surface,
            args.verbose,
        ) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("cli: {}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    regions: &[RegionArg],
    strength: BlurStrength,
    surface: Option<SurfaceSize>,
    verbose: bool,
) -> Result<(), EditorError> {
    let image = load_image_sync(input)?;
    let (w, h) = match surface {
        Some(s) => (s.width, s.height),
        None => image.dimensions(),
    };

    let mut editor = Editor::new(w, h);
    editor.set_blur_strength(strength);
    if !editor.load_image_from(image, input) {
        return Err(EditorError::NoImage);
    }

    for region in regions {
        let outcome = editor.apply_blur(region.left, region.top, region.width, region.height);
        if verbose {
            match outcome {
                SelectionOutcome::Committed(rect) => println!(
                    "  blur {}x{} at ({}, {})",
                    rect.width, rect.height, rect.x, rect.y
                ),
                other => println!("  skipped {:?}: {:?}", region, other),
            }
        }
    }

    editor.save_png(output)
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Output path for one input:
/// 1. `--output` as given
/// 2. `--output-dir/<stem>.png`
/// 3. `mosaic-image.png` beside the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    if let Some(dir) = output_dir {
        let stem = input.file_stem()?.to_string_lossy().into_owned();
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(DEFAULT_EXPORT_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_arguments() {
        assert_eq!(
            "10, 20,30,40".parse::<RegionArg>().unwrap(),
            RegionArg { left: 10, top: 20, width: 30, height: 40 }
        );
        assert_eq!("-5,-5,10,10".parse::<RegionArg>().unwrap().left, -5);
        assert!("1,2,3".parse::<RegionArg>().is_err());
        assert!("a,2,3,4".parse::<RegionArg>().is_err());
        assert!("0,0,-3,4".parse::<RegionArg>().is_err());
    }

    #[test]
    fn parses_surface_size() {
        assert_eq!(
            "760x600".parse::<SurfaceSize>().unwrap(),
            SurfaceSize { width: 760, height: 600 }
        );
        assert!(matches!("760".parse::<SurfaceSize>(), Err(EditorError::InvalidSurface(_))));
        assert!(matches!("0x10".parse::<SurfaceSize>(), Err(EditorError::InvalidSurface(_))));
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), Some(Path::new("out"))),
            Some(PathBuf::from("x.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/cat.png"))
        );
        assert_eq!(
            build_output_path(input, None, None),
            Some(PathBuf::from("shots/mosaic-image.png"))
        );
    }

    #[test]
    fn args_parse_with_repeated_regions() {
        let args = CliArgs::try_parse_from([
            "MosaicFE", "-i", "a.png", "-r", "0,0,10,10", "-r", "5,5,20,20", "-s", "80", "--surface", "100x50",
        ])
        .unwrap();
        assert_eq!(args.regions.len(), 2);
        assert_eq!(args.strength, 80);
        assert_eq!(args.surface, Some(SurfaceSize { width: 100, height: 50 }));
    }

    #[test]
    fn strength_outside_zero_to_hundred_is_rejected() {
        for bad in ["101", "150", "300", "-1"] {
            assert!(
                CliArgs::try_parse_from(["MosaicFE", "-i", "a.png", "-s", bad]).is_err(),
                "-s {bad} should be rejected"
            );
        }
        for good in ["0", "100"] {
            let args = CliArgs::try_parse_from(["MosaicFE", "-i", "a.png", "-s", good]).unwrap();
            assert_eq!(args.strength.to_string(), good);
        }
    }

    #[test]
    fn surface_errors_name_the_surface() {
        let err = "12by4".parse::<SurfaceSize>().unwrap_err();
        assert!(err.to_string().starts_with("Invalid surface size:"), "{err}");
    }
}
