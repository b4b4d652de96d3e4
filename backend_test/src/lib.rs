use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one against a fresh
/// in-memory server, optionally logged in, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// `crate::store::Store` and `crate::clock::ManualClock`, each at most once.
///
/// `#[backend_test(admin)]` logs the client in as the configured admin;
/// `#[backend_test(voter)]` registers `NewVoter::example()` and logs in as them.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the arguments to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Log in the client as admin/voter if needed.
    let maybe_login = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "admin" => quote! {
            let response = rocket_client
                .post(uri!(crate::api::auth::admin_login))
                .header(rocket::http::ContentType::JSON)
                .body(rocket::serde::json::json!(crate::model::api::auth::LoginRequest::example_admin()).to_string())
                .dispatch()
                .await;
            assert_eq!(rocket::http::Status::Ok, response.status(), "admin login failed");
        },
        Some(arg) if arg == "voter" => quote! {
            store
                .voters
                .create(crate::model::db::voter::NewVoter::example())
                .await
                .unwrap();

            let response = rocket_client
                .post(uri!(crate::api::auth::login))
                .header(rocket::http::ContentType::JSON)
                .body(rocket::serde::json::json!(crate::model::api::auth::LoginRequest::example()).to_string())
                .dispatch()
                .await;
            assert_eq!(rocket::http::Status::Ok, response.status(), "voter login failed");
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `admin` or `voter`")
                .into_compile_error()
                .into();
        }
        None => quote! {},
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                crate::store::Store,
                crate::clock::ManualClock,
            ) {
                log4rs_test_utils::test_logging::init_logging_once_for(
                    ["studentvote_backend"],
                    None,
                    None,
                );

                let store = crate::store::Store::memory();
                let clock = crate::clock::ManualClock::default();
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_store(store.clone(), std::sync::Arc::new(clock.clone())),
                )
                .await
                .unwrap();

                let config = rocket_client
                    .rocket()
                    .state::<crate::config::Config>()
                    .unwrap();
                store.ensure_defaults(config, &clock).await.unwrap();

                // Scoped so the login response no longer borrows the client.
                {
                    #maybe_login
                }

                (rocket_client, store, clock)
            }

            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                #[allow(unused_variables)]
                let (rocket_client, store, clock) = setup().await;
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut args = vec![];
    let mut seen: Vec<&'static str> = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                // Valid as the last path segment for any type is itself.
                let type_ident = &type_path.path.segments.last().unwrap().ident;
                let injected = if type_ident == "Client" {
                    Some(("Client", quote! { rocket_client }))
                } else if type_ident == "Store" {
                    Some(("Store", quote! { store.clone() }))
                } else if type_ident == "ManualClock" {
                    Some(("ManualClock", quote! { clock.clone() }))
                } else {
                    None
                };

                if let Some((kind, arg)) = injected {
                    if seen.contains(&kind) {
                        return Err(syn::Error::new(
                            input.span(),
                            format!("Test cannot accept more than one `{kind}`"),
                        ));
                    }
                    seen.push(kind);
                    args.push(arg);
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `store_ident: Store` or `clock_ident: ManualClock`",
        ));
    }

    Ok(args)
}
