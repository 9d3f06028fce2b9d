use hover_translate::cloud::GoogleCloudTranslator;
use hover_translate::collaborators::{Collaborators, CloudTranslator, Dictionary};
use hover_translate::coordinator::LookupCoordinator;
use hover_translate::dictionary::JsonDictionary;
use hover_translate::input::{input_bus, InputSource, SyntheticKeys};
use hover_translate::logging;
use hover_translate::ocr::TesseractRecognizer;
use hover_translate::overlay::TracingOverlaySink;
use hover_translate::platform::{ClipboardSelectionProbe, RdevInputSource, ScreenshotCapture};
use hover_translate::resolver::{FallbackResolver, ResolverBackends};
use hover_translate::runtime::Runtime;
use hover_translate::settings::{default_settings_path, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path);
    let settings = Settings::load(&path.to_string_lossy())?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));
    tracing::info!(settings = %path.display(), languages = %settings.language_pair(), "starting");

    let dictionary: Option<Arc<dyn Dictionary>> = match &settings.dictionary_path {
        Some(dict_path) => match JsonDictionary::open(dict_path) {
            Ok(dictionary) => Some(Arc::new(dictionary)),
            Err(e) => {
                tracing::error!("failed to load dictionary {}: {e:#}", dict_path);
                None
            }
        },
        None => None,
    };
    let cloud: Arc<dyn CloudTranslator> = Arc::new(GoogleCloudTranslator::new(
        &settings.cloud_endpoint,
        settings.cloud_api_key(),
        settings.cloud_timeout(),
    )?);
    if !cloud.is_configured() {
        tracing::warn!("no cloud translation key configured; only dictionary and on-device lookups are available");
    }
    let resolver = Arc::new(FallbackResolver::new(ResolverBackends {
        dictionary,
        on_device: None,
        cloud: Some(cloud),
    }));

    let synthetic = SyntheticKeys::default();
    let collaborators = Collaborators::new(
        Arc::new(ScreenshotCapture::new(settings.capture_width, settings.capture_height)),
        Arc::new(TesseractRecognizer::new(&settings.ocr_command, settings.ocr_timeout())?),
    )
    .with_clipboard(Arc::new(ClipboardSelectionProbe::new(synthetic.clone())));

    let coordinator = LookupCoordinator::new(
        collaborators,
        resolver,
        Arc::new(TracingOverlaySink),
        settings.language_pair(),
        settings.coordinator_config(),
    );

    let (sender, bus) = input_bus();
    let mut hook = RdevInputSource::new();
    hook.install(sender.muted_by(synthetic))?;
    let runtime = Runtime::new(settings.runtime_config(), coordinator, bus)
        .with_cursor(Arc::new(hook.cursor()));

    let shutdown = CancellationToken::new();
    let task = tokio::spawn(runtime.run(shutdown.clone()));
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    shutdown.cancel();
    let _ = task.await;
    hook.uninstall()?;
    Ok(())
}
