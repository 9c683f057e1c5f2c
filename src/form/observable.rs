//! Single-threaded observer core the form engine is built on.
//!
//! A [`Subject`] is a hot producer with a subscriber registry and, when
//! created with [`Subject::replaying`], a latest-value cell handed to every
//! new subscriber. Deliveries are trampolined: a value pushed from inside an
//! observer callback is queued and delivered once the current delivery
//! returns, so each subject delivers in call order. No `RefCell` borrow is
//! held while observers run, which makes it safe for a callback to emit,
//! subscribe, unsubscribe or complete.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::{Stream, StreamExt};

type ObserverFn<T> = Rc<dyn Fn(&T)>;

struct ObserverSlot<T> {
    id: u64,
    active: Cell<bool>,
    callback: ObserverFn<T>,
}

struct SubjectState<T> {
    replay: bool,
    latest: Option<T>,
    observers: Vec<Rc<ObserverSlot<T>>>,
    pending: VecDeque<T>,
    emitting: bool,
    completed: bool,
    next_observer_id: u64,
}

pub struct Subject<T> {
    inner: Rc<RefCell<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for Subject<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(state) => f
                .debug_struct("Subject")
                .field("replay", &state.replay)
                .field("observers", &state.observers.len())
                .field("completed", &state.completed)
                .finish(),
            Err(_) => f.write_str("Subject { <emitting> }"),
        }
    }
}

impl<T> Default for Subject<T>
where
    T: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subject<T>
where
    T: Clone + 'static,
{
    /// Publish-only subject: subscribers see values pushed after they subscribed.
    pub fn new() -> Self {
        Self::with_replay(false)
    }

    /// Subject that replays its most recently delivered value on subscribe.
    pub fn replaying() -> Self {
        Self::with_replay(true)
    }

    fn with_replay(replay: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectState {
                replay,
                latest: None,
                observers: Vec::new(),
                pending: VecDeque::new(),
                emitting: false,
                completed: false,
                next_observer_id: 0,
            })),
        }
    }

    pub fn next(&self, value: T) {
        {
            let mut state = self.inner.borrow_mut();
            if state.completed {
                return;
            }
            state.pending.push_back(value);
            if state.emitting {
                return;
            }
            state.emitting = true;
        }
        self.drain();
    }

    fn drain(&self) {
        loop {
            let (value, observers) = {
                let mut state = self.inner.borrow_mut();
                let Some(value) = state.pending.pop_front() else {
                    state.emitting = false;
                    return;
                };
                if state.replay {
                    state.latest = Some(value.clone());
                }
                (value, state.observers.clone())
            };
            for slot in observers {
                if slot.active.get() {
                    (slot.callback)(&value);
                }
            }
        }
    }

    /// Drops every observer and rejects further values and subscriptions.
    /// Calling it again is a no-op.
    pub fn complete(&self) {
        let (observers, pending) = {
            let mut state = self.inner.borrow_mut();
            if state.completed {
                return;
            }
            state.completed = true;
            state.latest = None;
            (
                std::mem::take(&mut state.observers),
                std::mem::take(&mut state.pending),
            )
        };
        for slot in &observers {
            slot.active.set(false);
        }
        drop(pending);
        drop(observers);
    }

    pub fn is_completed(&self) -> bool {
        self.inner.borrow().completed
    }

    pub fn latest(&self) -> Option<T> {
        self.inner.borrow().latest.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe_shared(Rc::new(observer))
    }

    fn subscribe_shared(&self, callback: ObserverFn<T>) -> Subscription {
        let (slot, replay) = {
            let mut state = self.inner.borrow_mut();
            if state.completed {
                return Subscription::empty();
            }
            let id = state.next_observer_id;
            state.next_observer_id += 1;
            let slot = Rc::new(ObserverSlot {
                id,
                active: Cell::new(true),
                callback,
            });
            state.observers.push(slot.clone());
            (slot, state.latest.clone())
        };

        if let Some(value) = replay {
            (slot.callback)(&value);
        }

        let id = slot.id;
        let slot = Rc::downgrade(&slot);
        let subject = Rc::downgrade(&self.inner);
        Subscription::new(move || release_observer(&subject, &slot, id))
    }

    pub fn observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable {
            subscribe_fn: Rc::new(move |callback: ObserverFn<T>| {
                subject.subscribe_shared(callback)
            }),
        }
    }

    /// Forwards every item of `stream` into this subject. Resolves when the
    /// stream ends or the subject completes.
    pub async fn pump<S>(&self, stream: S)
    where
        S: Stream<Item = T>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(value) = stream.next().await {
            if self.is_completed() {
                break;
            }
            self.next(value);
        }
    }
}

fn release_observer<T>(
    subject: &Weak<RefCell<SubjectState<T>>>,
    slot: &Weak<ObserverSlot<T>>,
    id: u64,
) {
    if let Some(slot) = slot.upgrade() {
        slot.active.set(false);
    }
    let Some(subject) = subject.upgrade() else {
        return;
    };
    // An inactive slot that cannot be removed right now is skipped by
    // deliveries and freed when the subject completes.
    let removed = match subject.try_borrow_mut() {
        Ok(mut state) => state
            .observers
            .iter()
            .position(|slot| slot.id == id)
            .map(|index| state.observers.remove(index)),
        Err(_) => None,
    };
    drop(removed);
}

pub struct Observable<T> {
    subscribe_fn: Rc<dyn Fn(ObserverFn<T>) -> Subscription>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: self.subscribe_fn.clone(),
        }
    }
}

impl<T> Debug for Observable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Observable")
    }
}

impl<T> Observable<T>
where
    T: Clone + 'static,
{
    /// An observable that completes on subscribe without emitting.
    pub fn empty() -> Self {
        Self {
            subscribe_fn: Rc::new(|_: ObserverFn<T>| Subscription::empty()),
        }
    }

    pub fn merge(sources: impl IntoIterator<Item = Observable<T>>) -> Self {
        let sources = sources.into_iter().collect::<Vec<_>>();
        Self {
            subscribe_fn: Rc::new(move |callback: ObserverFn<T>| {
                Subscription::all(
                    sources
                        .iter()
                        .map(|source| (source.subscribe_fn)(callback.clone()))
                        .collect(),
                )
            }),
        }
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        (self.subscribe_fn)(Rc::new(observer))
    }

    /// Bridges into a `futures::Stream`. Values replayed on subscribe are
    /// buffered; the stream ends once the source completes and unsubscribes
    /// when dropped.
    pub fn stream(&self) -> ObservableStream<T> {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = self.subscribe(move |value: &T| {
            let _ = sender.unbounded_send(value.clone());
        });
        ObservableStream {
            receiver,
            _subscription: subscription,
        }
    }
}

pub struct ObservableStream<T> {
    receiver: UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> Stream for ObservableStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_next_unpin(cx)
    }
}

pub trait ValueSource<T> {
    fn observe(&self) -> Observable<T>;
}

impl<T> ValueSource<T> for Subject<T>
where
    T: Clone + 'static,
{
    fn observe(&self) -> Observable<T> {
        self.observable()
    }
}

impl<T> ValueSource<T> for Observable<T> {
    fn observe(&self) -> Observable<T> {
        self.clone()
    }
}

impl<T, S> ValueSource<T> for &S
where
    S: ValueSource<T> + ?Sized,
{
    fn observe(&self) -> Observable<T> {
        (**self).observe()
    }
}

/// Releases its observer when dropped, unless detached.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        if subscriptions.is_empty() {
            return Self::empty();
        }
        Self::new(move || drop(subscriptions))
    }

    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    /// Keeps the observer registered until its source completes.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}

#[derive(Default)]
struct BagState {
    disposed: bool,
    subscriptions: Vec<Subscription>,
}

/// Owns subscriptions and releases all of them exactly once.
#[derive(Default)]
pub struct DisposeBag {
    state: RefCell<BagState>,
}

impl DisposeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions added after [`DisposeBag::dispose`] are released at once.
    pub fn add(&self, subscription: Subscription) {
        let rejected = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                Some(subscription)
            } else {
                state.subscriptions.push(subscription);
                None
            }
        };
        drop(rejected);
    }

    pub fn dispose(&self) {
        let subscriptions = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.subscriptions)
        };
        drop(subscriptions);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn len(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for DisposeBag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeBag")
            .field("disposed", &self.is_disposed())
            .field("subscriptions", &self.len())
            .finish()
    }
}
