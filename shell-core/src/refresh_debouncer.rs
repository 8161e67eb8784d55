use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    append_menu_log,
    dispatch_bus::{Action, DispatchBus},
    menu_model::MenuRenderer,
    tab_store::{RecordView, TabEvent},
};

struct ScheduledRefresh {
    generation: u64,
    handle: JoinHandle<()>,
}

struct DebounceState {
    next_generation: u64,
    scheduled: Option<ScheduledRefresh>,
}

struct DebounceInner<V, M> {
    view: Arc<V>,
    renderer: Arc<M>,
    bus: Arc<DispatchBus>,
    window: Duration,
    runtime: Handle,
    state: Mutex<DebounceState>,
}

impl<V, M> DebounceInner<V, M>
where
    V: RecordView + 'static,
    M: MenuRenderer + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, DebounceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(error) => error.into_inner(),
        }
    }

    /// Replaces whatever refresh is pending with one `window` from now.
    fn schedule(self: &Arc<Self>) {
        let mut state = self.lock_state();
        if let Some(previous) = state.scheduled.take() {
            previous.handle.abort();
        }
        state.next_generation += 1;
        let generation = state.next_generation;

        let weak = Arc::downgrade(self);
        let window = self.window;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation);
            }
        });
        state.scheduled = Some(ScheduledRefresh { generation, handle });
    }

    fn fire(&self, generation: u64) {
        {
            let mut state = self.lock_state();
            match state.scheduled.as_ref() {
                Some(scheduled) if scheduled.generation == generation => {
                    state.scheduled = None;
                }
                _ => return,
            }
        }
        self.refresh();
    }

    fn refresh(&self) {
        let tabs = self.view.sorted_view();
        let tab_count = tabs.len();
        let _ = self.bus.publish(Action::TabsRefreshed { tabs: tabs.clone() });

        let bus = self.bus.clone();
        self.renderer.rebuild_menu(
            &tabs,
            Box::new(move |result| match result {
                Ok(()) => {
                    let _ = bus.publish(Action::MenuRefreshed { tab_count });
                }
                Err(error) => append_menu_log(&format!("failed to rebuild tab menu: {error}")),
            }),
        );
    }
}

/// Coalesces bursts of tab mutations into one menu refresh per quiet window.
/// At most one refresh timer is alive at a time; every new event cancels the
/// previous one, so the refresh reflects the view as of the last event.
pub struct RefreshDebouncer<V, M> {
    inner: Arc<DebounceInner<V, M>>,
}

impl<V, M> Clone for RefreshDebouncer<V, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, M> RefreshDebouncer<V, M>
where
    V: RecordView + 'static,
    M: MenuRenderer + 'static,
{
    pub fn new(
        view: Arc<V>,
        renderer: Arc<M>,
        bus: Arc<DispatchBus>,
        window: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(DebounceInner {
                view,
                renderer,
                bus,
                window,
                runtime,
                state: Mutex::new(DebounceState {
                    next_generation: 0,
                    scheduled: None,
                }),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Subscribes to the record view so every mutation reschedules a refresh.
    pub fn attach(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .view
            .subscribe(Arc::new(move |_event: &TabEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule();
                }
            }));
    }

    pub fn notify(&self) {
        self.inner.schedule();
    }

    pub fn refresh_now(&self) {
        self.inner.refresh();
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner.lock_state().scheduled.is_some()
    }
}
