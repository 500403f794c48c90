use super::FetchError;

/// Page sizes requested by the coordinator. The first page is larger so the
/// initial screen fills in one round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePolicy {
    pub first: u32,
    pub subsequent: u32,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self {
            first: 10,
            subsequent: 7,
        }
    }
}

impl PageSizePolicy {
    pub fn size_for(&self, page: u32) -> u32 {
        if page == 0 {
            self.first
        } else {
            self.subsequent
        }
    }
}

/// Ticket for a fetch that has been started. Handed back to [`Pager::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    generation: u64,
}

/// What applying a fetch result did to the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { page: u32, count: usize },
    Exhausted { page: u32 },
    Failed { page: u32, error: FetchError },
    /// The result belonged to a fetch started before the last reset and was dropped.
    Stale { page: u32 },
}

/// Pagination state: cursor, accumulated items, in-flight and exhaustion flags.
///
/// Pure state machine with no I/O; the coordinator drives it.
#[derive(Debug, Clone)]
pub struct Pager<T> {
    policy: PageSizePolicy,
    cursor: u32,
    items: Vec<T>,
    in_flight: bool,
    exhausted: bool,
    generation: u64,
}

impl<T> Pager<T> {
    pub fn new(policy: PageSizePolicy) -> Self {
        Self {
            policy,
            cursor: 0,
            items: Vec::new(),
            in_flight: false,
            exhausted: false,
            generation: 0,
        }
    }

    /// Back to an empty first page. Any fetch started before this call becomes stale.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.items.clear();
        self.in_flight = false;
        self.exhausted = false;
        self.generation += 1;
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn can_fetch(&self) -> bool {
        !self.in_flight && !self.exhausted
    }

    /// Claim the in-flight slot for the page at the cursor.
    /// Returns `None` when a fetch is already outstanding or the feed is exhausted.
    pub fn begin_fetch(&mut self) -> Option<PageRequest> {
        if !self.can_fetch() {
            return None;
        }
        self.in_flight = true;
        Some(PageRequest {
            page: self.cursor,
            size: self.policy.size_for(self.cursor),
            generation: self.generation,
        })
    }

    /// Apply the result of a fetch started with [`Pager::begin_fetch`].
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<T>, FetchError>,
    ) -> PageOutcome {
        if request.generation != self.generation || !self.in_flight {
            return PageOutcome::Stale { page: request.page };
        }
        self.in_flight = false;

        match result {
            Ok(items) if items.is_empty() => {
                self.exhausted = true;
                PageOutcome::Exhausted { page: request.page }
            }
            Ok(items) => {
                let count = items.len();
                self.items.extend(items);
                self.cursor += 1;
                PageOutcome::Appended {
                    page: request.page,
                    count,
                }
            }
            Err(error) => PageOutcome::Failed {
                page: request.page,
                error,
            },
        }
    }
}

impl<T> Default for Pager<T> {
    fn default() -> Self {
        Self::new(PageSizePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page(start: u32, len: u32) -> Vec<u32> {
        (start..start + len).collect()
    }

    #[test]
    fn test_first_page_uses_larger_size() {
        let mut pager: Pager<u32> = Pager::default();
        let req = pager.begin_fetch().unwrap();
        assert_eq!((req.page, req.size), (0, 10));
        pager.complete(req, Ok(page(0, 10)));

        let req = pager.begin_fetch().unwrap();
        assert_eq!((req.page, req.size), (1, 7));
    }

    #[test]
    fn test_second_begin_while_in_flight_is_refused() {
        let mut pager: Pager<u32> = Pager::default();
        assert!(pager.begin_fetch().is_some());
        assert!(pager.is_in_flight());
        assert!(pager.begin_fetch().is_none());
    }

    #[test]
    fn test_success_appends_and_advances_cursor() {
        let mut pager: Pager<u32> = Pager::default();
        let req = pager.begin_fetch().unwrap();
        let outcome = pager.complete(req, Ok(page(0, 10)));
        assert_eq!(outcome, PageOutcome::Appended { page: 0, count: 10 });
        assert_eq!(pager.items().len(), 10);
        assert_eq!(pager.cursor(), 1);
        assert!(!pager.is_in_flight());
        assert!(!pager.is_exhausted());
    }

    #[test]
    fn test_pages_concatenate_in_cursor_order() {
        let mut pager: Pager<u32> = Pager::default();
        for (start, len) in [(0, 10), (10, 7), (17, 7)] {
            let req = pager.begin_fetch().unwrap();
            pager.complete(req, Ok(page(start, len)));
        }
        assert_eq!(pager.items(), page(0, 24).as_slice());
        assert_eq!(pager.cursor(), 3);
    }

    #[test]
    fn test_empty_page_is_terminal() {
        let mut pager: Pager<u32> = Pager::default();
        let req = pager.begin_fetch().unwrap();
        pager.complete(req, Ok(page(0, 10)));
        let req = pager.begin_fetch().unwrap();
        let outcome = pager.complete(req, Ok(Vec::new()));

        assert_eq!(outcome, PageOutcome::Exhausted { page: 1 });
        assert!(pager.is_exhausted());
        assert_eq!(pager.cursor(), 1);
        assert!(pager.begin_fetch().is_none());
    }

    #[test]
    fn test_failure_leaves_cursor_and_items_alone() {
        let mut pager: Pager<u32> = Pager::default();
        let req = pager.begin_fetch().unwrap();
        let err = FetchError::Server {
            status: 500,
            message: "boom".into(),
        };
        let outcome = pager.complete(req, Err(err.clone()));

        assert_eq!(outcome, PageOutcome::Failed { page: 0, error: err });
        assert_eq!(pager.cursor(), 0);
        assert!(pager.items().is_empty());
        assert!(!pager.is_in_flight());
        assert!(!pager.is_exhausted());

        let retry = pager.begin_fetch().unwrap();
        assert_eq!((retry.page, retry.size), (0, 10));
    }

    #[test]
    fn test_result_from_before_reset_is_stale() {
        let mut pager: Pager<u32> = Pager::default();
        let old = pager.begin_fetch().unwrap();
        pager.reset();
        let fresh = pager.begin_fetch().unwrap();

        assert_eq!(pager.complete(old, Ok(page(0, 10))), PageOutcome::Stale { page: 0 });
        assert!(pager.items().is_empty());
        assert!(pager.is_in_flight());

        pager.complete(fresh, Ok(page(100, 10)));
        assert_eq!(pager.items()[0], 100);
    }

    #[test]
    fn test_reset_clears_exhaustion() {
        let mut pager: Pager<u32> = Pager::default();
        let req = pager.begin_fetch().unwrap();
        pager.complete(req, Ok(Vec::new()));
        assert!(pager.is_exhausted());

        pager.reset();
        assert!(!pager.is_exhausted());
        assert_eq!(pager.cursor(), 0);
        assert!(pager.can_fetch());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Begin,
        Deliver(u32),
        DeliverEmpty,
        Fail,
        Reset,
        DeliverOld,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => Just(Step::Begin),
            4 => (1u32..12).prop_map(Step::Deliver),
            1 => Just(Step::DeliverEmpty),
            2 => Just(Step::Fail),
            1 => Just(Step::Reset),
            1 => Just(Step::DeliverOld),
        ]
    }

    proptest! {
        #[test]
        fn test_random_sequences_keep_pager_consistent(steps in prop::collection::vec(step(), 1..60)) {
            let policy = PageSizePolicy::default();
            let mut pager: Pager<u32> = Pager::new(policy);
            let mut expected: Vec<u32> = Vec::new();
            let mut cursor = 0u32;
            let mut exhausted = false;
            let mut pending: Option<PageRequest> = None;
            let mut old: Option<PageRequest> = None;
            let mut next_item = 0u32;

            for step in steps {
                match step {
                    Step::Begin => {
                        let req = pager.begin_fetch();
                        if pending.is_some() || exhausted {
                            prop_assert!(req.is_none());
                        } else {
                            let req = req.unwrap();
                            prop_assert_eq!(req.page, cursor);
                            prop_assert_eq!(req.size, policy.size_for(cursor));
                            pending = Some(req);
                        }
                    }
                    Step::Deliver(n) => {
                        if let Some(req) = pending.take() {
                            let items = page(next_item, n);
                            next_item += n;
                            expected.extend(&items);
                            let outcome = pager.complete(req, Ok(items));
                            prop_assert_eq!(outcome, PageOutcome::Appended { page: cursor, count: n as usize });
                            cursor += 1;
                        }
                    }
                    Step::DeliverEmpty => {
                        if let Some(req) = pending.take() {
                            let outcome = pager.complete(req, Ok(Vec::new()));
                            prop_assert_eq!(outcome, PageOutcome::Exhausted { page: cursor });
                            exhausted = true;
                        }
                    }
                    Step::Fail => {
                        if let Some(req) = pending.take() {
                            let error = FetchError::Network("timed out".into());
                            let outcome = pager.complete(req, Err(error));
                            let failed = matches!(outcome, PageOutcome::Failed { .. });
                            prop_assert!(failed);
                        }
                    }
                    Step::Reset => {
                        if pending.is_some() {
                            old = pending.take();
                        }
                        pager.reset();
                        expected.clear();
                        cursor = 0;
                        exhausted = false;
                    }
                    Step::DeliverOld => {
                        if let Some(req) = old.take() {
                            let outcome = pager.complete(req, Ok(vec![u32::MAX]));
                            prop_assert_eq!(outcome, PageOutcome::Stale { page: req.page });
                        }
                    }
                }

                prop_assert_eq!(pager.items(), expected.as_slice());
                prop_assert_eq!(pager.cursor(), cursor);
                prop_assert_eq!(pager.is_exhausted(), exhausted);
                prop_assert_eq!(pager.is_in_flight(), pending.is_some());
            }
        }
    }
}
