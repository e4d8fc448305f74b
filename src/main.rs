use eframe::egui;
use mosaicfe::app::MosaicApp;
use mosaicfe::{cli, i18n, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        logger::init();
        i18n::init();
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Session log (overwrites previous session log)
    logger::init();
    i18n::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1040.0, 760.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("MosaicFE"),
        ..Default::default()
    };

    eframe::run_native(
        "MosaicFE",
        options,
        Box::new(|cc| Box::new(MosaicApp::new(cc))),
    )
}
