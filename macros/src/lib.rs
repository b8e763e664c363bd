//! Augment the development of codecs with procedural macros.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse::Parser, parse_macro_input, ItemFn, LitStr};

/// Run a test function with a [tracing](https://docs.rs/tracing) subscriber that captures
/// events at the given level (`DEBUG` by default) through the test writer.
///
/// The calling crate must depend on `tracing` and `tracing-subscriber`.
///
/// # Example
/// ```rust,ignore
/// use wirefield_macros::test_traced;
/// use tracing::{debug, info};
///
/// #[test_traced("INFO")]
/// fn test_info_level() {
///     info!("This is an info log");
///     debug!("This is a debug log (won't be shown)");
///     assert_eq!(2 + 2, 4);
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let level = match parse_level(attr) {
        Ok(level) => level,
        Err(err) => return err.to_compile_error().into(),
    };
    let level = syn::Ident::new(&level, proc_macro2::Span::call_site());
    let input = parse_macro_input!(item as ItemFn);

    let name = &input.sig.ident;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let block = &input.block;
    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            let subscriber = ::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(::tracing::Level::#level)
                .with_line_number(true)
                .finish();
            let dispatcher = ::tracing::Dispatch::new(subscriber);
            ::tracing::dispatcher::with_default(&dispatcher, || #block);
        }
    };
    TokenStream::from(expanded)
}

/// Accepts `"LEVEL"` or `level = "LEVEL"`.
fn parse_level(attr: TokenStream) -> Result<String, syn::Error> {
    if attr.is_empty() {
        return Ok("DEBUG".to_string());
    }
    let lit = match syn::parse::<LitStr>(attr.clone()) {
        Ok(lit) => lit,
        Err(_) => {
            let mut level = None;
            let parser = syn::meta::parser(|meta| {
                if meta.path.is_ident("level") {
                    level = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("expected a log level"))
                }
            });
            parser.parse(attr)?;
            level.ok_or_else(|| {
                syn::Error::new(proc_macro2::Span::call_site(), "expected a log level")
            })?
        }
    };
    let level = lit.value().to_uppercase();
    match level.as_str() {
        "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR" => Ok(level),
        _ => Err(syn::Error::new_spanned(
            lit,
            "invalid level: expected TRACE, DEBUG, INFO, WARN, or ERROR",
        )),
    }
}
