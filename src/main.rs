#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // File dialogs are spawned on the runtime; the window runs on this thread
    lct_annotator::run_app()
}
