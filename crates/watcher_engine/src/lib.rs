//! Watcher engine: page fetching, rule evaluation, notification and the poll loop.
mod classifier;
mod decode;
mod document;
mod fetch;
mod notify;
mod poller;
mod types;

pub use classifier::{Classifier, SelectorClassifier};
pub use decode::{decode_page, DecodedPage};
pub use document::PageDocument;
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use notify::{
    alert_body, NotificationEndpoint, Notifier, NotifyError, NotifySettings, SmtpNotifier,
    ALERT_SUBJECT,
};
pub use poller::{PollSettings, Poller};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
