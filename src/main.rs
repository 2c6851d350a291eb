use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use blobmeter::app::App;
use blobmeter::cli::Cli;
use blobmeter::display::SpinnerContainer;
use blobmeter::router;

fn main() -> miette::Result<()> {
    init_tracing();

    let cli = Cli::new();
    let no_animate = cli.no_animate;

    let ctx = App::new(cli)?;

    // Stops itself on drop, so an early return through `?` leaves a clean line behind.
    let mut spinner = SpinnerContainer::create_spinner_unless_no_terminal_or(no_animate, "Scanning");

    let output_message = router::does_the_thing(&ctx)?;

    spinner.stop_with_message(&output_message);

    Ok(())
}

// private

/// Logs go to stderr, stdout is reserved for the result.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blobmeter=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
