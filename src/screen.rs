use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;

use crate::backend::Backend;
use crate::models::{
    Alert, Booking, BookingForm, BookingStatus, BookingViewModel, Role, ServiceWithProvider,
};
use crate::services::bookings::{fetch_bookings, DEFAULT_BOOKING_LIMIT};
use crate::services::catalog::load_catalog;
use crate::services::formatter::format_bookings;
use crate::services::listener::ChangeListener;
use crate::services::mutations::{self, MutationError};
use crate::services::role::RoleResolver;
use crate::services::session::{current_user_id, SessionOutcome};

pub type BookingMadeCallback = Arc<dyn Fn() + Send + Sync>;

/// Everything the view draws. Transient: the backend owns the real data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScreenState {
    pub loading: bool,
    pub services: Vec<ServiceWithProvider>,
    pub bookings: Vec<BookingViewModel>,
    /// The service whose request form is open, if any.
    pub selected_service: Option<String>,
    pub user_id: Option<String>,
    pub role: Role,
    pub alert: Option<Alert>,
}

pub struct ScreenBuilder {
    backend: Backend,
    roles: Arc<dyn RoleResolver>,
    booking_limit: usize,
    on_booking_made: Option<BookingMadeCallback>,
}

impl ScreenBuilder {
    pub fn booking_limit(mut self, limit: usize) -> Self {
        self.booking_limit = limit;
        self
    }

    pub fn on_booking_made(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_booking_made = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> BookingScreen {
        let (state, _) = watch::channel(ScreenState::default());
        BookingScreen {
            inner: Arc::new(ScreenInner {
                backend: self.backend,
                roles: self.roles,
                booking_limit: self.booking_limit,
                on_booking_made: self.on_booking_made,
                state,
                generation: AtomicU64::new(0),
            }),
            listener: Mutex::new(None),
        }
    }
}

struct ScreenInner {
    backend: Backend,
    roles: Arc<dyn RoleResolver>,
    booking_limit: usize,
    on_booking_made: Option<BookingMadeCallback>,
    state: watch::Sender<ScreenState>,
    /// Bumped by every booking refresh; only the newest one may land.
    generation: AtomicU64,
}

impl ScreenInner {
    fn current_identity(&self) -> (Option<String>, Role) {
        let state = self.state.borrow();
        (state.user_id.clone(), state.role)
    }

    async fn load_services(&self) {
        self.state.send_modify(|s| s.loading = true);
        let services = load_catalog(self.backend.data.as_ref()).await;
        self.state.send_modify(|s| {
            s.services = services;
            s.loading = false;
        });
    }

    async fn refresh_bookings(&self, user_id: Option<String>, role: Role) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let rows = fetch_bookings(
            self.backend.data.as_ref(),
            user_id.as_deref(),
            role,
            self.booking_limit,
        )
        .await;
        let bookings = format_bookings(&rows);

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding superseded booking fetch");
            return;
        }
        self.state.send_modify(|s| s.bookings = bookings);
    }
}

/// The services & bookings screen: catalog, one inline request form, and the
/// viewer's recent bookings kept fresh from the change feed.
pub struct BookingScreen {
    inner: Arc<ScreenInner>,
    listener: Mutex<Option<ChangeListener>>,
}

impl BookingScreen {
    pub fn builder(backend: Backend, roles: Arc<dyn RoleResolver>) -> ScreenBuilder {
        ScreenBuilder {
            backend,
            roles,
            booking_limit: DEFAULT_BOOKING_LIMIT,
            on_booking_made: None,
        }
    }

    /// Reads the session, then loads the catalog and the viewer's bookings
    /// concurrently. The change listener is installed once per mount.
    pub async fn mount(&self) {
        self.install_listener();

        let session = current_user_id(self.inner.backend.auth.as_ref()).await;
        let user_id = session.user_id().map(str::to_string);
        let role = self.inner.roles.resolve(user_id.as_deref()).await;

        self.inner.state.send_modify(|s| {
            s.user_id = user_id.clone();
            s.role = role;
            if user_id.is_none() {
                s.bookings.clear();
            }
            if let SessionOutcome::Failed(message) = &session {
                s.alert = Some(Alert::new("Authentication Error", message.clone()));
            }
        });

        tracing::info!(
            user_id = user_id.as_deref().unwrap_or("-"),
            role = role.as_str(),
            "screen mounted"
        );

        tokio::join!(
            self.inner.load_services(),
            self.inner.refresh_bookings(user_id, role),
        );
    }

    fn install_listener(&self) {
        let mut listener = self.listener.lock().unwrap();
        if listener.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        *listener = Some(ChangeListener::install(
            self.inner.backend.realtime.clone(),
            move |_event| {
                let inner = Arc::clone(&inner);
                async move {
                    let (user_id, role) = inner.current_identity();
                    inner.refresh_bookings(user_id, role).await;
                }
            },
        ));
    }

    /// Tears down the change subscription. In-flight fetches are not
    /// cancelled.
    pub fn unmount(&self) {
        if let Some(listener) = self.listener.lock().unwrap().take() {
            listener.release();
            tracing::info!("screen unmounted");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(ChangeListener::is_active)
    }

    /// Re-runs the role-scoped booking fetch for the current viewer.
    pub async fn refresh(&self) {
        let (user_id, role) = self.inner.current_identity();
        self.inner.refresh_bookings(user_id, role).await;
    }

    /// Opens the request form for `service_id`, closing any other.
    pub fn select_service(&self, service_id: &str) {
        self.inner
            .state
            .send_modify(|s| s.selected_service = Some(service_id.to_string()));
    }

    pub fn close_form(&self) {
        self.inner.state.send_modify(|s| s.selected_service = None);
    }

    pub fn dismiss_alert(&self) {
        self.inner.state.send_modify(|s| s.alert = None);
    }

    /// Submits the open form as a pending booking for the selected service.
    /// A missing session is reported before any form validation.
    pub async fn submit_booking(&self, form: BookingForm) -> Result<Booking, MutationError> {
        let (user_id, selected) = {
            let state = self.inner.state.borrow();
            (state.user_id.clone(), state.selected_service.clone())
        };

        if user_id.is_none() {
            self.inner.state.send_modify(|s| {
                s.alert = Some(Alert::new(
                    "Not Logged In",
                    "You must be logged in to make a booking.",
                ))
            });
            tracing::warn!("booking attempted without a session");
            return Err(MutationError::NotSignedIn);
        }
        let service_id = selected.ok_or(MutationError::NoServiceSelected)?;
        if form.booking_date.trim().is_empty() {
            return Err(MutationError::MissingDate);
        }

        let result = mutations::create_booking(
            self.inner.backend.data.as_ref(),
            user_id.as_deref(),
            &service_id,
            &form,
        )
        .await;

        match &result {
            Ok(_) => {
                if let Some(callback) = &self.inner.on_booking_made {
                    callback();
                }
                self.close_form();
            }
            Err(e) => tracing::error!(error = %e, service_id = %service_id, "failed to create booking"),
        }
        result
    }

    /// Practitioner response to a booking request.
    pub async fn respond(&self, booking_id: &str, status: BookingStatus) -> Result<(), MutationError> {
        let result =
            mutations::update_booking_status(self.inner.backend.data.as_ref(), booking_id, status)
                .await;
        self.after_status_change(booking_id, status, &result);
        result
    }

    pub async fn cancel(&self, booking_id: &str) -> Result<(), MutationError> {
        let result = mutations::cancel_booking(self.inner.backend.data.as_ref(), booking_id).await;
        self.after_status_change(booking_id, BookingStatus::Cancelled, &result);
        result
    }

    fn after_status_change(
        &self,
        booking_id: &str,
        status: BookingStatus,
        result: &Result<(), MutationError>,
    ) {
        match result {
            Ok(()) => {
                self.inner.state.send_modify(|s| {
                    mutations::patch_status(&mut s.bookings, booking_id, status);
                });
            }
            Err(e) => {
                tracing::error!(error = %e, booking_id, status = status.as_str(), "failed to update booking")
            }
        }
    }

    pub fn snapshot(&self) -> ScreenState {
        self.inner.state.borrow().clone()
    }

    /// Receives a notification on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.inner.state.subscribe()
    }
}

impl Drop for BookingScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}
