use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::handler::EnrolmentEventHandler;
use crate::host::HostDirectory;
use crate::i18n::DateFormatError;
use crate::notification::{MessageTransport, NotificationDispatcher, SenderIdentity};
use crate::template::TemplateRenderer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub directory: Arc<dyn HostDirectory>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub handler: Arc<EnrolmentEventHandler>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the renderer, dispatcher and event handler around the given
    /// host directory and transport.
    pub fn new(
        settings: Settings,
        directory: Arc<dyn HostDirectory>,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self, DateFormatError> {
        let renderer = TemplateRenderer::new(settings.date_formatter()?);
        let sender = SenderIdentity::new(&settings.site.support_name, &settings.site.support_email);
        let dispatcher = Arc::new(NotificationDispatcher::new(renderer, transport, sender));
        let handler = Arc::new(EnrolmentEventHandler::new(
            directory.clone(),
            dispatcher.clone(),
            settings.policy_settings(),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            directory,
            dispatcher,
            handler,
            started_at: Instant::now(),
        })
    }
}
