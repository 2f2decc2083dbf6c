//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    config::Config,
    http::HttpTransport,
    services::{classifier::NumberClassifier, graph_client::GraphClient, twilio_client::TwilioClient},
};

/// Cheap to clone: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub graph: GraphClient,
    pub twilio: TwilioClient,
    pub classifier: Arc<NumberClassifier>,
}

impl AppState {
    pub fn new(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let graph = GraphClient::new(transport.clone(), &config);
        let twilio = TwilioClient::new(transport, &config);
        let classifier = Arc::new(NumberClassifier::from_config(&config));
        Self {
            config: Arc::new(config),
            graph,
            twilio,
            classifier,
        }
    }
}
