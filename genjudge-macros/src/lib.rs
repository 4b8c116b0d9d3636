
use proc_macro::TokenStream;

/// Runs an async test against a fake ledger.
///
/// The test function takes a single `Harness` argument, which must be defined at the root of the test crate. Time
/// starts paused, so waiting on the finality policy costs nothing.
#[proc_macro_attribute]
pub fn test(args: TokenStream, item: TokenStream) -> TokenStream {
    test::test_macro(args.into(), item.into()).into()
}
