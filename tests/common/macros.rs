/// Asserts that a node's closed and open counts sum to the channel count.
#[macro_export]
macro_rules! assert_conserved {
    ($store:expr, $node:expr, $n_na:expr) => {
        let state = $store.get($node).expect("Node not initialized");
        assert_eq!(
            state.closed as u64 + state.open as u64,
            $n_na as u64,
            "Population not conserved at node {}: closed={} open={}",
            $node,
            state.closed,
            state.open
        );
    };
}

/// Asserts that the open count lies within `[0, n_na]`.
#[macro_export]
macro_rules! assert_open_in_range {
    ($open:expr, $n_na:expr) => {
        assert!(
            ($open as u64) <= ($n_na as u64),
            "Open count {} exceeds channel count {}",
            $open,
            $n_na
        );
    };
}
