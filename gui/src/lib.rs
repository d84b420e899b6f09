use iced::Command;
use pipeline_service::{Dataset, Extracted, Pipeline, RunOutcome, Stage};
use report::{
    to_csv, to_display, write_csv, write_html, DisplayComment, DEFAULT_CSV_FILE_NAME,
    DEFAULT_HTML_FILE_NAME,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use threadmood_core::{
    validate_endpoint, CoreError, ErrorReporter, Preferences, PreferencesStore, SentimentCounts,
    Theme as ThemePreference,
};
use tracing::{debug, info};

mod view;

pub const EXTRACTING_STATUS: &str = "Extracting comments...";
pub const COPIED_STATUS: &str = "CSV copied to clipboard ✅";
pub const METRICS_FILE_NAME: &str = "classifier_metrics.json";

#[derive(Debug, Clone)]
pub enum Message {
    ApiUrlChanged(String),
    Refresh,
    Extracted(Extracted),
    RunFinished(Arc<RunOutcome>),
    DatasetLoaded(Option<Dataset>),
    ToggleTheme,
    CopyCsv,
    ExportCsv,
    ExportHtml,
    ExportMetrics,
    MetricsExported(Result<String, Arc<CoreError>>),
}

pub struct App {
    pipeline: Pipeline,
    preferences: Preferences,
    preferences_store: Option<PreferencesStore>,
    export_dir: PathBuf,
    reporter: ErrorReporter,
    api_url: String,
    status: String,
    dataset: Option<Dataset>,
    display: Vec<DisplayComment>,
}

impl App {
    pub fn new(
        pipeline: Pipeline,
        preferences: Preferences,
        preferences_store: Option<PreferencesStore>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            pipeline,
            api_url: preferences.api_url.clone(),
            preferences,
            preferences_store,
            export_dir,
            reporter: ErrorReporter::new(),
            status: String::new(),
            dataset: None,
            display: Vec::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn comments(&self) -> &[DisplayComment] {
        &self.display
    }

    pub fn counts(&self) -> SentimentCounts {
        self.dataset
            .as_ref()
            .map(|dataset| dataset.counts)
            .unwrap_or_default()
    }

    pub fn theme(&self) -> iced::Theme {
        match self.preferences.theme {
            ThemePreference::Light => iced::Theme::Light,
            ThemePreference::Dark => iced::Theme::Dark,
        }
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::ApiUrlChanged(value) => {
                self.api_url = value;
                Command::none()
            }
            Message::Refresh => self.refresh(),
            Message::Extracted(extracted) => {
                self.status = extracted.status_message();
                let pipeline = self.pipeline.clone();
                Command::perform(async move { pipeline.finish(extracted).await }, |outcome| {
                    Message::RunFinished(Arc::new(outcome))
                })
            }
            Message::RunFinished(outcome) => {
                if let Some(status) = outcome.status_message() {
                    self.status = status;
                }
                if !outcome.is_applied() {
                    return Command::none();
                }

                let store = Arc::clone(self.pipeline.store());
                Command::perform(async move { store.current().await }, Message::DatasetLoaded)
            }
            Message::DatasetLoaded(dataset) => {
                self.show(dataset);
                Command::none()
            }
            Message::ToggleTheme => {
                self.preferences.theme = self.preferences.theme.toggled();
                debug!("Theme switched to {:?}", self.preferences.theme);
                self.persist_preferences();
                Command::none()
            }
            Message::CopyCsv => {
                let csv = self.csv();
                self.status = COPIED_STATUS.to_string();
                iced::clipboard::write(csv)
            }
            Message::ExportCsv => {
                let path = self.export_dir.join(DEFAULT_CSV_FILE_NAME);
                let result = write_csv(&path, self.merged());
                self.finish_export(path, result);
                Command::none()
            }
            Message::ExportHtml => {
                let path = self.export_dir.join(DEFAULT_HTML_FILE_NAME);
                let result = write_html(&path, &self.display, &self.counts());
                self.finish_export(path, result);
                Command::none()
            }
            Message::ExportMetrics => {
                let pipeline = self.pipeline.clone();
                Command::perform(
                    async move { pipeline.export_metrics().await.map_err(Arc::new) },
                    Message::MetricsExported,
                )
            }
            Message::MetricsExported(Ok(json)) => {
                let path = self.export_dir.join(METRICS_FILE_NAME);
                let result = fs::write(&path, json).map_err(CoreError::from);
                self.finish_export(path, result);
                Command::none()
            }
            Message::MetricsExported(Err(error)) => {
                self.status = self.reporter.report_error(&error);
                Command::none()
            }
        }
    }

    pub fn view(&self) -> iced::Element<Message, iced::Theme> {
        view::render(self)
    }

    fn refresh(&mut self) -> Command<Message> {
        let api_url = self.api_url.trim().to_string();
        if let Err(e) = validate_endpoint(&api_url) {
            self.status = self.reporter.report_error(&CoreError::from(e));
            return Command::none();
        }

        if self.preferences.api_url != api_url {
            self.preferences.api_url = api_url.clone();
            self.persist_preferences();
        }

        info!("Refreshing against {}", api_url);
        self.status = EXTRACTING_STATUS.to_string();
        let pipeline = self.pipeline.clone();
        Command::perform(async move { pipeline.start(&api_url).await }, |stage| match stage {
            Stage::Extracted(extracted) => Message::Extracted(extracted),
            Stage::Finished(outcome) => Message::RunFinished(Arc::new(outcome)),
        })
    }

    fn show(&mut self, dataset: Option<Dataset>) {
        self.display = dataset
            .as_ref()
            .map(|dataset| to_display(&dataset.comments))
            .unwrap_or_default();
        self.dataset = dataset;
    }

    fn merged(&self) -> &[threadmood_core::MergedComment] {
        self.dataset
            .as_ref()
            .map(|dataset| dataset.comments.as_slice())
            .unwrap_or(&[])
    }

    fn csv(&self) -> String {
        to_csv(self.merged())
    }

    fn finish_export(&mut self, path: PathBuf, result: Result<(), CoreError>) {
        self.status = match result {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => self.reporter.report_error(&e),
        };
    }

    fn persist_preferences(&mut self) {
        let Some(store) = &self.preferences_store else {
            return;
        };
        if let Err(e) = store.save(&self.preferences) {
            self.status = self.reporter.report_error(&CoreError::from(e));
        }
    }
}
