/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use proc_macro::TokenStream;
use quote::quote;
use syn::Expr;
use syn::ItemFn;
use syn::Lit;
use syn::MetaNameValue;
use syn::Token;
use syn::parse_macro_input;
use syn::punctuated::Punctuated;

/// Runs an async test on its own tokio runtime, failing it if it has not
/// finished within `timeout_secs` of wall-clock time.
///
/// With `start_paused = true` the test runs on a current-thread runtime
/// whose clock starts paused, so `tokio::time` sleeps and timeouts advance
/// instantly once every task is idle. The wall-clock watchdog still applies.
///
/// # Examples
///
/// ```rust
/// #[async_timed_test(timeout_secs = 5)]
/// async fn my_test() {
///     tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
/// }
///
/// #[async_timed_test(timeout_secs = 5, start_paused = true)]
/// async fn my_paused_test() {
///     // Completes immediately in real time.
///     tokio::time::sleep(tokio::time::Duration::from_secs(24 * 60 * 60)).await;
/// }
/// ```
#[proc_macro_attribute]
pub fn async_timed_test(attr: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated::<MetaNameValue, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    let mut timeout_secs = None;
    let mut start_paused = false;
    for arg in args {
        if arg.path.is_ident("timeout_secs") {
            match int_literal(&arg.value) {
                Some(secs) => timeout_secs = Some(secs),
                None => {
                    return error(
                        &arg.value,
                        "unexpected value for timeout_secs, please pass an integer literal",
                    );
                }
            }
        } else if arg.path.is_ident("start_paused") {
            match bool_literal(&arg.value) {
                Some(paused) => start_paused = paused,
                None => {
                    return error(
                        &arg.value,
                        "unexpected value for start_paused, please pass true or false",
                    );
                }
            }
        } else {
            return error(
                &arg.path,
                "only timeout_secs and start_paused allowed as arguments",
            );
        }
    }
    let Some(timeout_secs) = timeout_secs else {
        return TokenStream::from(
            syn::Error::new(proc_macro::Span::call_site().into(), "timeout_secs is required")
                .to_compile_error(),
        );
    };

    let fn_block = &input_fn.block;
    let fn_attrs = &input_fn.attrs;
    let fn_vis = &input_fn.vis;
    let sig = &input_fn.sig;
    let fn_name = &sig.ident;
    let output = &sig.output;

    if sig.asyncness.is_none() {
        return error(sig, "test function must be async");
    }

    let runtime = if start_paused {
        quote! {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .unwrap()
        }
    } else {
        quote! {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(8)
                .enable_all()
                .build()
                .unwrap()
        }
    };

    let output = quote! {
        #[test]
        #(#fn_attrs)*
        #fn_vis fn #fn_name() #output {
            use std::sync::mpsc::{channel, RecvTimeoutError};
            use std::thread;
            use std::time::Duration;

            let (result_tx, result_rx) = channel();

            // The runtime is driven from its own thread so that the watchdog
            // below fires even if the runtime wedges.
            thread::spawn(move || {
                let test_rt = #runtime;
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    test_rt.block_on(async #fn_block)
                }));
                let _ = result_tx.send(result);
            });

            match result_rx.recv_timeout(Duration::from_secs(#timeout_secs)) {
                Ok(Ok(test_result)) => test_result,
                Ok(Err(panic)) => std::panic::resume_unwind(panic),
                Err(RecvTimeoutError::Timeout) => {
                    panic!("test timed out after {} seconds", #timeout_secs);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    panic!("test thread panicked without sending result");
                }
            }
        }
    };

    output.into()
}

fn int_literal(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(val) => val.base10_parse::<u64>().ok(),
            _ => None,
        },
        _ => None,
    }
}

fn bool_literal(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Bool(val) => Some(val.value),
            _ => None,
        },
        _ => None,
    }
}

fn error(tokens: impl quote::ToTokens, message: &str) -> TokenStream {
    TokenStream::from(syn::Error::new_spanned(tokens, message).to_compile_error())
}
