//! Keeps a client's product list consistent with the gateway.
//!
//! The controller owns the [`CollectionState`] a list view renders. Every
//! list fetch is tagged with a sequence number and only the newest one may
//! write its result, so a slow response never overwrites a fresher one.
//! Mutations do not patch the list locally: on success the controller
//! fetches the whole list again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use storefront_core::{Credential, Page, Product, ProductDraft};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ProductApi;
use crate::auth::CredentialProvider;
use crate::error::{ClientError, Result};
use crate::state::{CollectionState, DeleteRequest, Notice, Refresh, ViewStatus};

/// Tuning for a [`SyncController`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Products per page (default: 5)
    pub page_size: u32,
    /// Quiet period after the last keystroke before a search fetch (default: 300ms)
    pub debounce: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 5,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Client-side owner of the product list view.
///
/// Cheap to clone; clones share state. Dropping the last clone cancels a
/// pending debounced search.
#[derive(Clone)]
pub struct SyncController {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn ProductApi>,
    credentials: Arc<dyn CredentialProvider>,
    debounce: Duration,
    shared: Mutex<Shared>,
    pending_search: Mutex<Option<PendingSearch>>,
    timers: AtomicU64,
}

struct Shared {
    view: CollectionState,
    /// Sequence number of the newest list fetch issued
    issued: u64,
    notices: Vec<Notice>,
}

struct PendingSearch {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Inner {
    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingSearch>> {
        self.pending_search.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels a debounce timer that has not fired yet.
    fn cancel_pending_search(&self) {
        if let Some(pending) = self.pending().take() {
            pending.handle.abort();
        }
    }

    /// Marks timer `generation` as fired. False if it was superseded.
    fn fire_pending_search(&self, generation: u64) -> bool {
        let mut pending = self.pending();
        match pending.as_ref() {
            Some(p) if p.generation == generation => {
                *pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = self
            .pending_search
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = pending.take() {
            pending.handle.abort();
        }
    }
}

impl SyncController {
    pub fn new(
        api: Arc<dyn ProductApi>,
        credentials: Arc<dyn CredentialProvider>,
        options: SyncOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                credentials,
                debounce: options.debounce,
                shared: Mutex::new(Shared {
                    view: CollectionState::new(options.page_size),
                    issued: 0,
                    notices: Vec::new(),
                }),
                pending_search: Mutex::new(None),
                timers: AtomicU64::new(0),
            }),
        }
    }

    /// A copy of the current view state.
    pub fn snapshot(&self) -> CollectionState {
        self.inner.shared().view.clone()
    }

    /// The products on the current page.
    pub fn page_view(&self) -> Page<Product> {
        self.inner.shared().view.page_view()
    }

    /// Moves to another page. Local only; nothing is fetched.
    pub fn set_page(&self, page: u32) {
        self.inner.shared().view.page = page.max(1);
    }

    /// Selects a product for editing.
    pub fn select(&self, product: Product) {
        self.inner.shared().view.selected = Some(product);
    }

    pub fn clear_selection(&self) {
        self.inner.shared().view.selected = None;
    }

    /// Drains the notices raised since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.shared().notices)
    }

    /// Fetches the list for the current search term.
    ///
    /// On failure the previous items stay in place and the status becomes
    /// [`ViewStatus::Failed`]. If a newer fetch is issued before this one
    /// completes, this one's result is dropped and
    /// [`Refresh::Superseded`] is returned.
    pub async fn refresh(&self) -> Result<Refresh> {
        let (seq, term) = {
            let mut shared = self.inner.shared();
            shared.issued += 1;
            shared.view.status = ViewStatus::Loading;
            (shared.issued, shared.view.search_term.clone())
        };

        let credential = self.credential().await;
        let search = (!term.is_empty()).then_some(term.as_str());
        let result = self.inner.api.list(search, credential.as_ref()).await;

        let mut shared = self.inner.shared();
        if shared.issued != seq {
            debug!(seq, latest = shared.issued, "dropping superseded product list");
            return Ok(Refresh::Superseded);
        }

        match result {
            Ok(items) => {
                debug!("loaded {} products", items.len());
                shared.view.items = items;
                shared.view.status = ViewStatus::Ready;
                Ok(Refresh::Applied)
            }
            Err(e) => {
                warn!("Failed to fetch products: {}", e);
                shared.view.status = ViewStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Handles a change of the search field.
    ///
    /// The term and page update immediately. A non-empty term is fetched
    /// once input has been quiet for the debounce window, replacing any
    /// timer still waiting. An empty term cancels the timer and fetches the
    /// unfiltered list right away.
    pub async fn search(&self, term: impl Into<String>) -> Result<()> {
        let term = term.into();
        {
            let mut shared = self.inner.shared();
            shared.view.search_term = term.clone();
            shared.view.page = 1;
        }
        self.inner.cancel_pending_search();

        if term.is_empty() {
            return self.refresh().await.map(|_| ());
        }
        self.schedule_search();
        Ok(())
    }

    fn schedule_search(&self) {
        let generation = self.inner.timers.fetch_add(1, Ordering::Relaxed) + 1;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.debounce;

        let mut pending = self.inner.pending();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.fire_pending_search(generation) {
                return;
            }
            let controller = SyncController { inner };
            if let Err(e) = controller.refresh().await {
                debug!("debounced search failed: {}", e);
            }
        });
        *pending = Some(PendingSearch { generation, handle });
    }

    /// Creates a product, then reloads the list.
    pub async fn create(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        self.set_status(ViewStatus::Loading);

        let credential = self.credential().await;
        match self.inner.api.create(&draft, credential.as_ref()).await {
            Ok(product) => {
                self.notify(Notice::success("Product created successfully"));
                self.reload_after_mutation().await;
                Ok(product)
            }
            Err(e) => {
                self.fail("Failed to create product", &e);
                Err(e)
            }
        }
    }

    /// Saves `draft` over the selected product, then reloads the list.
    pub async fn update(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let selected = self
            .inner
            .shared()
            .view
            .selected
            .clone()
            .ok_or(ClientError::NothingSelected)?;
        let payload = draft.with_id(selected.product_id);
        self.set_status(ViewStatus::Loading);

        let credential = self.credential().await;
        match self.inner.api.update(&payload, credential.as_ref()).await {
            Ok(product) => {
                self.clear_selection();
                self.notify(Notice::success("Product updated successfully"));
                self.reload_after_mutation().await;
                Ok(product)
            }
            Err(e) => {
                self.fail("Failed to update product", &e);
                Err(e)
            }
        }
    }

    /// Updates the selected product, or creates one when nothing is selected.
    pub async fn submit(&self, draft: ProductDraft) -> Result<Product> {
        let editing = self.inner.shared().view.selected.is_some();
        if editing {
            self.update(draft).await
        } else {
            self.create(draft).await
        }
    }

    /// Starts a delete. Nothing happens until the request is confirmed.
    pub fn request_delete(&self, product: &Product) -> DeleteRequest {
        DeleteRequest {
            product_id: product.product_id.clone(),
            product_title: product.product_title.clone(),
        }
    }

    /// Deletes the product, returns to page 1 and reloads the list.
    ///
    /// On failure the items are left untouched.
    pub async fn confirm_delete(&self, request: DeleteRequest) -> Result<()> {
        self.set_status(ViewStatus::Loading);

        let credential = self.credential().await;
        match self.inner.api.delete(&request.product_id, credential.as_ref()).await {
            Ok(_) => {
                {
                    let mut shared = self.inner.shared();
                    shared.view.page = 1;
                    if shared
                        .view
                        .selected
                        .as_ref()
                        .is_some_and(|p| p.product_id == request.product_id)
                    {
                        shared.view.selected = None;
                    }
                    shared.notices.push(Notice::success("Product deleted successfully"));
                }
                self.reload_after_mutation().await;
                Ok(())
            }
            Err(e) => {
                self.fail("Failed to delete product", &e);
                Err(e)
            }
        }
    }

    async fn credential(&self) -> Option<Credential> {
        self.inner.credentials.credential().await
    }

    async fn reload_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            debug!("reload after mutation failed: {}", e);
        }
    }

    fn set_status(&self, status: ViewStatus) {
        self.inner.shared().view.status = status;
    }

    fn notify(&self, notice: Notice) {
        self.inner.shared().notices.push(notice);
    }

    fn fail(&self, message: &str, error: &ClientError) {
        warn!("{}: {}", message, error);
        let mut shared = self.inner.shared();
        shared.view.status = ViewStatus::Failed(error.to_string());
        shared.notices.push(Notice::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use storefront_core::{refine, ProductId, ValidationError};
    use tokio::sync::oneshot;
    use tokio::time::{sleep, Instant};

    use crate::auth::StaticCredentials;
    use crate::state::NoticeKind;

    #[derive(Debug, Clone)]
    struct ListCall {
        search: Option<String>,
        credential: Option<String>,
        at: Instant,
    }

    /// In-memory product service that filters like the gateway does.
    #[derive(Default)]
    struct FakeApi {
        products: Mutex<Vec<Product>>,
        next_id: AtomicU64,
        list_calls: Mutex<Vec<ListCall>>,
        mutations: AtomicU64,
        fail_lists: AtomicBool,
        fail_mutations: AtomicBool,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl FakeApi {
        fn with_titles(titles: &[&str]) -> Arc<Self> {
            let api = Arc::new(Self::default());
            for title in titles {
                let id = api.allocate_id();
                api.products
                    .lock()
                    .unwrap()
                    .push(ProductDraft::new(*title, 10.0).with_id(id));
            }
            api
        }

        fn allocate_id(&self) -> ProductId {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            ProductId::parse(n.to_string()).unwrap()
        }

        fn list_calls(&self) -> Vec<ListCall> {
            self.list_calls.lock().unwrap().clone()
        }

        fn mutations(&self) -> u64 {
            self.mutations.load(Ordering::SeqCst)
        }

        fn failure() -> ClientError {
            ClientError::Gateway {
                status: 500,
                message: "upstream down".to_string(),
                details: None,
            }
        }

        fn mutation(&self) -> crate::Result<()> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            if self.fail_mutations.load(Ordering::SeqCst) {
                Err(Self::failure())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ProductApi for FakeApi {
        async fn list(&self, search: Option<&str>, credential: Option<&Credential>) -> crate::Result<Vec<Product>> {
            self.list_calls.lock().unwrap().push(ListCall {
                search: search.map(String::from),
                credential: credential.map(|c| c.expose().to_string()),
                at: Instant::now(),
            });
            let products = refine(self.products.lock().unwrap().clone(), search.unwrap_or_default());
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_lists.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            Ok(products)
        }

        async fn get(&self, id: &ProductId, _credential: Option<&Credential>) -> crate::Result<Product> {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|p| &p.product_id == id)
                .cloned()
                .ok_or_else(Self::failure)
        }

        async fn create(&self, draft: &ProductDraft, _credential: Option<&Credential>) -> crate::Result<Product> {
            self.mutation()?;
            let product = draft.clone().with_id(self.allocate_id());
            self.products.lock().unwrap().push(product.clone());
            Ok(product)
        }

        async fn update(&self, product: &Product, _credential: Option<&Credential>) -> crate::Result<Product> {
            self.mutation()?;
            let mut products = self.products.lock().unwrap();
            let slot = products
                .iter_mut()
                .find(|p| p.product_id == product.product_id)
                .ok_or_else(Self::failure)?;
            *slot = product.clone();
            Ok(product.clone())
        }

        async fn delete(&self, id: &ProductId, _credential: Option<&Credential>) -> crate::Result<Value> {
            self.mutation()?;
            self.products.lock().unwrap().retain(|p| &p.product_id != id);
            Ok(json!({ "message": "deleted" }))
        }
    }

    fn controller(api: &Arc<FakeApi>) -> SyncController {
        let api: Arc<dyn ProductApi> = api.clone();
        SyncController::new(
            api,
            Arc::new(StaticCredentials::anonymous()),
            SyncOptions::default(),
        )
    }

    fn titles(products: &[Product]) -> Vec<String> {
        products.iter().map(|p| p.product_title.clone()).collect()
    }

    #[tokio::test]
    async fn first_refresh_moves_idle_to_ready() {
        let api = FakeApi::with_titles(&["Red Shirt", "Blue Pants"]);
        let controller = controller(&api);
        assert_eq!(controller.snapshot().status, ViewStatus::Idle);

        assert_eq!(controller.refresh().await.unwrap(), Refresh::Applied);

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Ready);
        assert_eq!(titles(&state.items), ["Red Shirt", "Blue Pants"]);
        assert_eq!(api.list_calls()[0].search, None);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_items() {
        let api = FakeApi::with_titles(&["Red Shirt"]);
        let controller = controller(&api);
        controller.refresh().await.unwrap();

        api.fail_lists.store(true, Ordering::SeqCst);
        assert!(controller.refresh().await.is_err());

        let state = controller.snapshot();
        assert_eq!(state.status, ViewStatus::Failed("upstream down".to_string()));
        assert_eq!(titles(&state.items), ["Red Shirt"]);

        api.fail_lists.store(false, Ordering::SeqCst);
        controller.refresh().await.unwrap();
        assert_eq!(controller.snapshot().status, ViewStatus::Ready);
    }

    #[tokio::test]
    async fn credential_accompanies_every_call() {
        let api = FakeApi::with_titles(&["Mug"]);
        let controller = SyncController::new(
            api.clone(),
            Arc::new(StaticCredentials::new(Credential::new("tok").unwrap())),
            SyncOptions::default(),
        );

        controller.refresh().await.unwrap();

        assert_eq!(api.list_calls()[0].credential.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn create_reloads_from_server() {
        let api = FakeApi::with_titles(&["Red Shirt"]);
        let controller = controller(&api);
        controller.refresh().await.unwrap();

        let draft = ProductDraft::new("Desk Lamp", 35.0)
            .category("lighting")
            .description("Warm white");
        let created = controller.create(draft.clone()).await.unwrap();

        let state = controller.snapshot();
        assert_eq!(api.list_calls().len(), 2);
        let stored = state
            .items
            .iter()
            .find(|p| p.product_id == created.product_id)
            .unwrap();
        assert_eq!(ProductDraft::from(stored), draft);
        assert_eq!(state.status, ViewStatus::Ready);
        assert_eq!(
            controller.take_notices(),
            vec![Notice::success("Product created successfully")]
        );
        assert!(controller.take_notices().is_empty());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_api() {
        let api = FakeApi::with_titles(&[]);
        let controller = controller(&api);

        let err = controller.create(ProductDraft::new("", 1.0)).await.unwrap_err();

        assert!(matches!(err, ClientError::Invalid(ValidationError::EmptyTitle)));
        assert_eq!(api.mutations(), 0);
        assert_eq!(controller.snapshot().status, ViewStatus::Idle);
    }

    #[tokio::test]
    async fn update_targets_the_selection() {
        let api = FakeApi::with_titles(&["Red Shirt", "Blue Pants"]);
        let controller = controller(&api);
        controller.refresh().await.unwrap();

        let pants = controller.snapshot().items[1].clone();
        controller.select(pants.clone());
        let draft = ProductDraft::from(&pants).category("denim");
        let updated = controller.submit(draft).await.unwrap();

        assert_eq!(updated.product_id, pants.product_id);
        let state = controller.snapshot();
        assert_eq!(state.selected, None);
        assert_eq!(state.items[1].product_category.as_deref(), Some("denim"));
        assert_eq!(state.items.len(), 2);
    }

    #[tokio::test]
    async fn update_without_selection_fails() {
        let api = FakeApi::with_titles(&["Mug"]);
        let controller = controller(&api);

        let err = controller.update(ProductDraft::new("Cup", 2.0)).await.unwrap_err();

        assert!(matches!(err, ClientError::NothingSelected));
        assert_eq!(api.mutations(), 0);
    }

    #[tokio::test]
    async fn mutation_failure_is_a_notice_and_keeps_items() {
        let api = FakeApi::with_titles(&["Mug"]);
        let controller = controller(&api);
        controller.refresh().await.unwrap();
        api.fail_mutations.store(true, Ordering::SeqCst);

        assert!(controller.create(ProductDraft::new("Cup", 2.0)).await.is_err());

        let state = controller.snapshot();
        assert_eq!(titles(&state.items), ["Mug"]);
        assert!(matches!(state.status, ViewStatus::Failed(_)));
        assert_eq!(
            controller.take_notices(),
            vec![Notice::error("Failed to create product")]
        );
        assert_eq!(api.list_calls().len(), 1);
    }

    #[tokio::test]
    async fn confirmed_delete_resets_page_and_reloads() {
        let names: Vec<String> = (1..=12).map(|i| format!("Item {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let api = FakeApi::with_titles(&refs);
        let controller = controller(&api);
        controller.refresh().await.unwrap();
        controller.set_page(3);

        let target = controller.page_view().items[0].clone();
        let request = controller.request_delete(&target);
        assert_eq!(
            request.prompt(),
            "Are you sure to delete this product name: Item 11 ?"
        );
        controller.confirm_delete(request).await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.page, 1);
        assert_eq!(state.items.len(), 11);
        assert!(state.items.iter().all(|p| p.product_id != target.product_id));
        assert_eq!(
            controller.take_notices(),
            vec![Notice::success("Product deleted successfully")]
        );
    }

    #[tokio::test]
    async fn failed_delete_leaves_items_alone() {
        let api = FakeApi::with_titles(&["Mug", "Cup"]);
        let controller = controller(&api);
        controller.refresh().await.unwrap();
        controller.set_page(2);
        api.fail_mutations.store(true, Ordering::SeqCst);

        let request = controller.request_delete(&controller.snapshot().items[0]);
        assert!(controller.confirm_delete(request).await.is_err());

        let state = controller.snapshot();
        assert_eq!(titles(&state.items), ["Mug", "Cup"]);
        assert_eq!(state.page, 2);
        let notices = controller.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert_eq!(notices[0].message, "Failed to delete product");
    }

    #[tokio::test]
    async fn paging_is_local() {
        let names: Vec<String> = (1..=12).map(|i| format!("Item {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let api = FakeApi::with_titles(&refs);
        let controller = controller(&api);
        controller.refresh().await.unwrap();

        controller.set_page(3);
        let page = controller.page_view();

        assert_eq!(titles(&page.items), ["Item 11", "Item 12"]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(api.list_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_coalesce_into_one_fetch() {
        let api = FakeApi::with_titles(&["Red Shirt", "Blue Pants", "Shirt Case"]);
        let controller = controller(&api);
        controller.set_page(2);
        let start = Instant::now();

        controller.search("s").await.unwrap();
        assert_eq!(controller.snapshot().page, 1);
        sleep(Duration::from_millis(100)).await;
        controller.search("sh").await.unwrap();
        sleep(Duration::from_millis(50)).await;
        controller.search("shirt").await.unwrap();
        assert_eq!(controller.snapshot().search_term, "shirt");

        sleep(Duration::from_millis(290)).await;
        assert!(api.list_calls().is_empty());

        sleep(Duration::from_millis(20)).await;
        let calls = api.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search.as_deref(), Some("shirt"));
        let fired = calls[0].at - start;
        assert!(
            fired >= Duration::from_millis(450) && fired < Duration::from_millis(460),
            "fired at {fired:?}"
        );
        assert_eq!(titles(&controller.snapshot().items), ["Red Shirt", "Shirt Case"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_search_fetches_immediately() {
        let api = FakeApi::with_titles(&["Red Shirt", "Blue Pants"]);
        let controller = controller(&api);

        controller.search("pants").await.unwrap();
        controller.search("").await.unwrap();

        let calls = api.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].search, None);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(api.list_calls().len(), 1);
        assert_eq!(controller.snapshot().items.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_cancels_the_timer() {
        let api = FakeApi::with_titles(&["Mug"]);
        let controller = controller(&api);

        controller.search("mug").await.unwrap();
        drop(controller);
        sleep(Duration::from_secs(1)).await;

        assert!(api.list_calls().is_empty());
    }

    #[tokio::test]
    async fn stale_list_response_is_dropped() {
        let api = FakeApi::with_titles(&["Red Shirt", "Blue Pants"]);
        let controller = controller(&api);

        let (release, gate) = oneshot::channel();
        *api.gate.lock().unwrap() = Some(gate);
        let slow = tokio::spawn({
            let controller = controller.clone();
            async move { controller.refresh().await }
        });
        while api.list_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        // The server list changes while the first fetch is still in flight.
        api.products.lock().unwrap().pop();
        assert_eq!(controller.refresh().await.unwrap(), Refresh::Applied);

        release.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), Refresh::Superseded);

        let state = controller.snapshot();
        assert_eq!(titles(&state.items), ["Red Shirt"]);
        assert_eq!(state.status, ViewStatus::Ready);
    }
}
