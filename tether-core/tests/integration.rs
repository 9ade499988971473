//! Integration Tests for Store and Prop Injection
//!
//! These tests verify that the store, middleware, subscriptions and the prop
//! injector work together correctly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use parking_lot::Mutex;

use tether_core::inject::{
    PropContainer, PropInjector, Props, RecordingSink, SequentialIds, StaticProps,
};
use tether_core::store::middleware::from_fn;
use tether_core::store::{
    preset_reducer, Action, Dispatcher, LoggingMiddleware, MiddlewareApi, Next, PresetAction,
    Store, Subscription,
};
use tether_core::{StoreConfig, StoreError};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AppState {
    count: i64,
    user: String,
}

#[derive(Debug, Clone)]
enum AppAction {
    Increment,
    Login(String),
    Preset(PresetAction),
}

impl Action for AppAction {
    fn kind(&self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Login(_) => "login",
            Self::Preset(preset) => preset.kind(),
        }
    }
}

fn reduce(state: &AppState, action: &AppAction) -> AppState {
    match action {
        AppAction::Increment => AppState {
            count: state.count + 1,
            ..state.clone()
        },
        AppAction::Login(user) => AppState {
            user: user.clone(),
            ..state.clone()
        },
        AppAction::Preset(preset) => preset_reducer(state, preset),
    }
}

#[derive(Default)]
struct Recorder<T> {
    pushes: Mutex<Vec<T>>,
}

impl<T> Recorder<T> {
    fn count(&self) -> usize {
        self.pushes.lock().len()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> PropContainer for Recorder<T> {
    type StateProps = T;
    type ActionProps = Dispatcher<AppState, AppAction>;

    fn receive_props(&self, props: Props<T, Dispatcher<AppState, AppAction>>) {
        self.pushes.lock().push(props.state);
    }
}

/// The counter scenario: five increments, one early subscriber.
#[test]
fn five_increments_notify_five_times() {
    init_tracing();

    let store = Store::builder(AppState::default(), reduce)
        .middleware(LoggingMiddleware)
        .build();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let _subscription = store.subscribe(move |state| seen_clone.lock().push(state.count));

    for _ in 0..5 {
        store.dispatch(AppAction::Increment).unwrap();
    }

    assert_eq!(store.state().count, 5);

    let seen = seen.lock();
    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}

/// Final state is the left fold of the reducer, whatever the subscribers do.
#[test]
fn state_is_left_fold_of_actions() {
    let actions = vec![
        AppAction::Login("ada".into()),
        AppAction::Increment,
        AppAction::Preset(PresetAction::Noop),
        AppAction::Increment,
        AppAction::Login("grace".into()),
    ];
    let expected = actions
        .iter()
        .fold(AppState::default(), |state, action| reduce(&state, action));

    let store = Store::new(AppState::default(), reduce);
    let calls = Arc::new(AtomicUsize::new(0));
    let subscriptions: Vec<Subscription> = (0..3)
        .map(|_| {
            let calls = calls.clone();
            store.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for action in actions.iter().cloned() {
        store.dispatch(action).unwrap();
    }

    assert_eq!(*store.state(), expected);
    assert_eq!(calls.load(Ordering::SeqCst), actions.len() * subscriptions.len());
}

/// The preset noop leaves state alone but still counts as a dispatch.
#[test]
fn preset_noop_is_identity() {
    let initial = AppState {
        count: 3,
        user: "linus".into(),
    };
    let store = Store::new(initial.clone(), reduce);

    store.dispatch(AppAction::Preset(PresetAction::Noop)).unwrap();

    assert_eq!(*store.state(), initial);
    assert_eq!(store.version(), 1);
}

/// Two components on one injector; only the one whose slice changed is pushed.
#[test]
fn only_affected_component_is_pushed() {
    init_tracing();

    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()));

    let count_view = Arc::new(Recorder::<i64>::default());
    let user_view = Arc::new(Recorder::<String>::default());

    let _count_props = injector.inject(count_view.clone(), |s: &AppState| s.count, |d| d);
    let _user_props = injector.inject(user_view.clone(), |s: &AppState| s.user.clone(), |d| d);

    store.dispatch(AppAction::Login("ada".into())).unwrap();

    assert_eq!(*count_view.pushes.lock(), vec![0]);
    assert_eq!(*user_view.pushes.lock(), vec![String::new(), "ada".to_string()]);

    store.dispatch(AppAction::Increment).unwrap();

    assert_eq!(*count_view.pushes.lock(), vec![0, 1]);
    assert_eq!(user_view.count(), 2);
}

/// After eject, dispatches no longer reach the component.
#[test]
fn no_pushes_after_eject() {
    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()));
    let view = Arc::new(Recorder::<i64>::default());

    let props = injector.inject(view.clone(), |s: &AppState| s.count, |d| d);
    store.dispatch(AppAction::Increment).unwrap();
    assert_eq!(view.count(), 2);

    props.eject();
    for _ in 0..3 {
        store.dispatch(AppAction::Increment).unwrap();
    }

    assert_eq!(view.count(), 2);
    assert_eq!(store.subscriber_count(), 0);
}

/// Dropping the binding record detaches it as well.
#[test]
fn dropping_static_props_detaches() {
    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()));
    let view = Arc::new(Recorder::<i64>::default());

    {
        let _props = injector.inject(view.clone(), |s: &AppState| s.count, |d| d);
        assert_eq!(store.subscriber_count(), 1);
    }

    store.dispatch(AppAction::Increment).unwrap();
    assert_eq!(view.count(), 1);
    assert_eq!(injector.live_bindings(), 0);
}

/// Mock props need an injector but never register with its store.
#[test]
fn mock_static_props() {
    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()).with_ids(SequentialIds::default()));

    let a = StaticProps::mock(injector.clone());
    let b = StaticProps::mock(injector.clone());

    assert!(a.subscription().is_noop());
    assert_ne!(a.id(), b.id());
    assert_ne!(a.id().raw(), 0);

    a.subscription().cancel();
    b.eject();

    assert_eq!(store.subscriber_count(), 0);
    assert_eq!(store.version(), 0);
}

/// Components dispatch through their action props; the store feeds the
/// result back to them.
#[test]
fn component_round_trip_through_action_props() {
    struct Clicker {
        dispatcher: Mutex<Option<Arc<Dispatcher<AppState, AppAction>>>>,
        seen: Mutex<Vec<i64>>,
    }

    impl PropContainer for Clicker {
        type StateProps = i64;
        type ActionProps = Dispatcher<AppState, AppAction>;

        fn receive_props(&self, props: Props<i64, Dispatcher<AppState, AppAction>>) {
            if props.first_instance {
                *self.dispatcher.lock() = Some(props.action.clone());
            }
            self.seen.lock().push(props.state);
        }
    }

    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()));
    let clicker = Arc::new(Clicker {
        dispatcher: Mutex::new(None),
        seen: Mutex::new(Vec::new()),
    });

    let _props = injector.inject(clicker.clone(), |s: &AppState| s.count, |d| d);

    let dispatcher = clicker.dispatcher.lock().clone().unwrap();
    dispatcher.dispatch(AppAction::Increment).unwrap();
    dispatcher.dispatch(AppAction::Increment).unwrap();

    assert_eq!(*clicker.seen.lock(), vec![0, 1, 2]);
}

/// A component that dispatches while receiving props is deferred, not
/// deadlocked, and sees the follow-up state.
#[test]
fn component_dispatch_during_push_is_deferred() {
    struct AutoLogin {
        seen: Mutex<Vec<String>>,
    }

    impl PropContainer for AutoLogin {
        type StateProps = (i64, String);
        type ActionProps = Dispatcher<AppState, AppAction>;

        fn receive_props(&self, props: Props<(i64, String), Dispatcher<AppState, AppAction>>) {
            let (count, user) = props.state;
            if count == 1 && user.is_empty() {
                props.action.dispatch(AppAction::Login("auto".into())).unwrap();
            }
            self.seen.lock().push(user);
        }
    }

    let store = Store::new(AppState::default(), reduce);
    let injector = Arc::new(PropInjector::new(store.clone()));
    let view = Arc::new(AutoLogin {
        seen: Mutex::new(Vec::new()),
    });

    let _props = injector.inject(
        view.clone(),
        |s: &AppState| (s.count, s.user.clone()),
        |d| d,
    );

    store.dispatch(AppAction::Increment).unwrap();

    assert_eq!(store.state().user, "auto");
    assert_eq!(*view.seen.lock(), vec!["", "", "auto"]);
}

/// Middleware runs around every action and sees consistent state.
#[test]
fn middleware_wraps_every_dispatch() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();

    let store = Store::builder(AppState::default(), reduce)
        .config(StoreConfig::default().with_label("app"))
        .middleware(LoggingMiddleware)
        .middleware(from_fn(
            move |api: &MiddlewareApi<'_, AppState, AppAction>,
                  action: AppAction,
                  next: Next<'_, AppState, AppAction>| {
                let kind = action.kind();
                next.run(action);
                log_clone.lock().push((kind, api.state().count, api.label().to_string()));
            },
        ))
        .build();

    store.dispatch(AppAction::Increment).unwrap();
    store.dispatch(AppAction::Login("ada".into())).unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            ("increment", 1, "app".to_string()),
            ("login", 1, "app".to_string()),
        ]
    );
}

/// A broken mapping is reported and contained.
#[test]
fn broken_mapping_is_reported() {
    init_tracing();

    let store = Store::builder(AppState::default(), reduce)
        .config(StoreConfig::default().with_strict(false))
        .build();
    let sink = Arc::new(RecordingSink::new());
    let injector = Arc::new(PropInjector::new(store.clone()).with_sink(sink.clone()));

    let good = Arc::new(Recorder::<i64>::default());
    let bad = Arc::new(Recorder::<usize>::default());

    let _good_props = injector.inject(good.clone(), |s: &AppState| s.count, |d| d);
    let bad_props = injector.inject(
        bad.clone(),
        |s: &AppState| {
            let names: Vec<&str> = s.user.split(',').collect();
            names[1].len()
        },
        |d| d,
    );

    // The initial mapping already fails: "" has no second name.
    assert!(!bad_props.is_live());
    assert_eq!(sink.reports().len(), 1);
    assert_eq!(sink.reports()[0].binding(), bad_props.id());

    store.dispatch(AppAction::Increment).unwrap();
    store.dispatch(AppAction::Login("a,b".into())).unwrap();

    assert_eq!(good.count(), 2);
    assert_eq!(bad.count(), 0);
    assert_eq!(store.subscriber_count(), 1);
}

/// Dispatch from inside a reducer is refused by a lenient store.
#[test]
fn reentrant_reducer_dispatch_is_refused() {
    let slot: Arc<Mutex<Option<Store<AppState, AppAction>>>> = Arc::new(Mutex::new(None));
    let errors = Arc::new(Mutex::new(Vec::new()));

    let slot_clone = slot.clone();
    let errors_clone = errors.clone();
    let store = Store::builder(
        AppState::default(),
        move |state: &AppState, action: &AppAction| {
            let store = slot_clone.lock().clone();
            if let Some(store) = store {
                if let Err(err) = store.dispatch(AppAction::Increment) {
                    errors_clone.lock().push(err);
                }
            }
            reduce(state, action)
        },
    )
    .config(StoreConfig::default().with_strict(false))
    .build();
    *slot.lock() = Some(store.clone());

    store.dispatch(AppAction::Login("ada".into())).unwrap();

    assert_eq!(store.state().count, 0);
    assert!(matches!(
        errors.lock().as_slice(),
        [StoreError::ReentrantDispatch { .. }]
    ));

    slot.lock().take();
}

/// Async work hands its result back through the dispatch queue.
#[tokio::test]
async fn queue_serializes_async_producers() {
    let store = Store::new(AppState::default(), reduce);
    let (queue, task) = store.spawn_queue();

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    queue.send(AppAction::Increment).await.unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }
    drop(queue);
    task.await.unwrap();

    assert_eq!(store.state().count, 100);
    assert_eq!(store.version(), 100);
}
