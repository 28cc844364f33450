use std::sync::Arc;

use crate::page::{NavigationObserver, ObserverId, Page};

/// How a recorder is hooked into the page's client-side navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSubscription {
    /// Registered with the page's routing hook; removed on detach
    Route(ObserverId),
    /// `pushState`/`replaceState` wrapper; stays installed after detach
    HistoryWrapper,
}

/// Subscribe `observer` to client-side navigation. Prefers the page's routing
/// hook and falls back to wrapping the history entry points, once per `key`.
pub fn attach(
    page: &mut Page,
    key: &str,
    observer: Arc<dyn NavigationObserver>,
) -> NavigationSubscription {
    if page.has_routing_hook() {
        tracing::debug!("Subscribing to routing hook on {}", page.url());
        return NavigationSubscription::Route(page.add_route_observer(observer));
    }

    if page.install_history_wrapper(key, observer) {
        tracing::debug!("Wrapped pushState/replaceState on {}", page.url());
    }
    NavigationSubscription::HistoryWrapper
}

pub fn detach(page: &mut Page, subscription: NavigationSubscription) {
    if let NavigationSubscription::Route(id) = subscription {
        page.remove_route_observer(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::NavigationKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Urls(Mutex<Vec<String>>);

    impl NavigationObserver for Urls {
        fn on_navigate(&self, url: &str, _kind: NavigationKind) {
            self.0.lock().unwrap().push(url.to_string());
        }
    }

    #[test]
    fn test_prefers_routing_hook() {
        let mut page = Page::from_html("https://app.test/", "<body></body>");
        page.set_routing_hook(true);
        let urls = Arc::new(Urls::default());

        let sub = attach(&mut page, "rec-1", urls.clone());
        assert!(matches!(sub, NavigationSubscription::Route(_)));
        assert!(!page.history().is_wrapped_by("rec-1"));

        page.notify_route_change("/a");
        detach(&mut page, sub);
        page.notify_route_change("/b");
        assert_eq!(*urls.0.lock().unwrap(), vec!["https://app.test/a"]);
    }

    #[test]
    fn test_falls_back_to_history_wrapper_once() {
        let mut page = Page::from_html("https://app.test/", "<body></body>");
        let urls = Arc::new(Urls::default());

        assert_eq!(attach(&mut page, "rec-1", urls.clone()), NavigationSubscription::HistoryWrapper);
        attach(&mut page, "rec-1", urls.clone());
        page.push_state("/x");

        assert_eq!(*urls.0.lock().unwrap(), vec!["https://app.test/x"]);
    }
}
