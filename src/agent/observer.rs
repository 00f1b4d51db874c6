//! Subscriber lists for streamed text and downloaded images.

use std::path::Path;
use std::sync::Arc;

/// Receives each streamed text fragment, possibly empty.
pub type TextObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives the local path of each downloaded image.
pub type ImageObserver = Arc<dyn Fn(&Path) + Send + Sync>;

/// Registered observers, invoked synchronously in registration order.
#[derive(Clone, Default)]
pub struct StreamObservers {
    text: Vec<TextObserver>,
    image: Vec<ImageObserver>,
}

impl StreamObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text(&mut self, observer: impl Fn(&str) + Send + Sync + 'static) -> &mut Self {
        self.text.push(Arc::new(observer));
        self
    }

    pub fn on_image(&mut self, observer: impl Fn(&Path) + Send + Sync + 'static) -> &mut Self {
        self.image.push(Arc::new(observer));
        self
    }

    pub(crate) fn notify_text(&self, fragment: &str) {
        for observer in &self.text {
            observer(fragment);
        }
    }

    pub(crate) fn notify_image(&self, path: &Path) {
        for observer in &self.image {
            observer(path);
        }
    }
}

impl std::fmt::Debug for StreamObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamObservers")
            .field("text", &self.text.len())
            .field("image", &self.image.len())
            .finish()
    }
}
