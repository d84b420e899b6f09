use anyhow::Context;
use gui::App;
use iced::{Application, Settings};
use page_extractor::{CommentExtractor, DocumentHost, ExtractionBridge, PageSource};
use pipeline_service::Pipeline;
use std::time::Duration;
use threadmood_core::{CoreError, ErrorReporter, Preferences, PreferencesStore};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            "threadmood=debug,gui=debug,pipeline_service=debug,page_extractor=info,sentiment_client=info",
        )
        .init();

    tracing::info!("Starting threadmood");

    let reporter = ErrorReporter::new();
    let preferences_store = match PreferencesStore::default_location() {
        Ok(store) => Some(store),
        Err(e) => {
            reporter.report_warning(&CoreError::from(e));
            None
        }
    };
    let preferences = match preferences_store.as_ref().map(PreferencesStore::load) {
        Some(Ok(preferences)) => preferences,
        Some(Err(e)) => {
            reporter.report_warning(&CoreError::from(e));
            Preferences::default()
        }
        None => Preferences::default(),
    };

    let extractor =
        CommentExtractor::new(&preferences.selectors).context("invalid comment selectors")?;

    // The document host runs beside the GUI's own executor for the whole session.
    let host_runtime = tokio::runtime::Runtime::new().context("failed to start page runtime")?;
    let bridge = match std::env::args().nth(1) {
        Some(location) => {
            let _guard = host_runtime.enter();
            DocumentHost::new(PageSource::parse(&location), extractor)
                .with_load_timeout(Duration::from_secs(preferences.extraction_timeout_secs))
                .spawn()
        }
        None => {
            tracing::warn!("No page given; refreshing will report that no page is active");
            ExtractionBridge::disconnected()
        }
    };

    let pipeline = Pipeline::from_preferences(bridge, &preferences)?;
    let export_dir = std::env::current_dir().context("failed to resolve export directory")?;
    let app = App::new(pipeline, preferences, preferences_store, export_dir);

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(900.0, 800.0),
            min_size: Some(iced::Size::new(600.0, 500.0)),
            ..Default::default()
        },
        ..Settings::with_flags(app)
    };

    let result = ThreadmoodApp::run(settings).map_err(|e| {
        tracing::error!("Application error: {}", e);
        anyhow::anyhow!("GUI error: {e}")
    });
    host_runtime.shutdown_background();
    result
}

struct ThreadmoodApp {
    app: App,
}

impl Application for ThreadmoodApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = App;

    fn new(app: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        (Self { app }, iced::Command::none())
    }

    fn title(&self) -> String {
        "threadmood - comment sentiment".to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }

    fn theme(&self) -> Self::Theme {
        self.app.theme()
    }
}
