use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicenote=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Voicenote");

    voicenote::audio::verify_pipeline()?;

    #[cfg(feature = "audio-io")]
    {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 640.0]),
            ..Default::default()
        };
        eframe::run_native(
            "Voicenote",
            options,
            Box::new(|cc| {
                let state =
                    voicenote::ui::AppState::new(voicenote::capture::CpalBackend::new());
                Ok(Box::new(voicenote::ui::ChatApp::new(cc, state)))
            }),
        )
        .map_err(|e| anyhow::anyhow!("failed to run UI: {}", e))?;
    }

    #[cfg(not(feature = "audio-io"))]
    info!("Built without audio-io; pipeline check finished, no UI to start");

    Ok(())
}
