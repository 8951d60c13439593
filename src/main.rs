use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_hexis::hex::ice::{IceEngine, IceParams, IcePatternSet};
use lib_hexis::prelude::*;

fn main() -> Result<()> {
    // Initialize program options and environment.
    dotenvy::dotenv().ok();
    let options = HtpServerOptions::parse();
    let _logger = Logger::try_with_env_or_str(options.log_level.clone().unwrap_or("info".into()).as_str())?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(
            match cfg!(debug_assertions) {
                true => AdaptiveFormat::WithThread,
                _    => AdaptiveFormat::Default
            })
        .set_palette("b196;208;195;111;67".to_owned())
        .start()?;

    // The inferior-cell engine lives for the whole process.
    let patterns = match &options.pattern_file {
        Some(path) => IcePatternSet::with_file(path).unwrap_or_else(|e| {
            log::warn!("pattern file disabled: {e}");
            IcePatternSet::builtin()
        }),
        None => IcePatternSet::builtin(),
    };
    let ice = Box::leak(Box::new(IceEngine::new(patterns, IceParams::default())));

    // Serve the engine protocol.
    let mut server = HtpServer::new(options, ice)?;
    if let Err(e) = server.run() {
        log::error!("fatal error: {}", e);
        return Err(e);
    }
    Ok(())
}
