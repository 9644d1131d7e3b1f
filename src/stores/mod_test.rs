use tokio::sync::broadcast::error::TryRecvError;

use super::*;

#[derive(Default)]
struct State {
    numbers: Resource<Vec<u32>>,
}

#[tokio::test]
async fn load_stores_data_and_clears_flags() {
    let state = RwLock::new(State::default());
    let notifier = Notifier::new();

    let result = load(&state, &notifier, Feedback::Toast, |s| &mut s.numbers, async { Ok(vec![1, 2, 3]) }).await;
    assert_eq!(result, ActionResult::ok());

    let state = state.read().await;
    assert_eq!(state.numbers.data, vec![1, 2, 3]);
    assert!(!state.numbers.loading);
    assert!(state.numbers.error.is_none());
}

#[tokio::test]
async fn failed_load_keeps_previous_data_and_toasts() {
    let state = RwLock::new(State { numbers: Resource { data: vec![7], ..Resource::default() } });
    let notifier = Notifier::new();
    let mut toasts = notifier.subscribe();

    let result = load(&state, &notifier, Feedback::Toast, |s| &mut s.numbers, async {
        Err(ApiError::from_response(503, String::new()))
    })
    .await;
    assert!(!result.success);

    let guard = state.read().await;
    assert_eq!(guard.numbers.data, vec![7]);
    assert_eq!(guard.numbers.error, result.message);
    assert_eq!(toasts.try_recv().unwrap().message, result.message.unwrap());
}

#[tokio::test]
async fn quiet_load_records_error_without_toast() {
    let state = RwLock::new(State::default());
    let notifier = Notifier::new();
    let mut toasts = notifier.subscribe();

    let result = load(&state, &notifier, Feedback::Quiet, |s| &mut s.numbers, async {
        Err(ApiError::Network("connection refused".into()))
    })
    .await;
    assert!(!result.success);
    assert!(state.read().await.numbers.error.is_some());
    assert!(matches!(toasts.try_recv(), Err(TryRecvError::Empty)));
}
