use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authgate::{
    ClientOptions, Config, ENV_ANON_KEY, ENV_BACKEND_URL, FlowError, FlowOutcome, OAuthFlow,
    OAuthProvider, PasswordFlow, Platform, RestAuthClient, SessionState, SessionStore,
    active_stack,
};

mod browser;

use crate::browser::PromptBrowser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("authgate=debug,{}=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env(Platform::Ios);
    let (Some(backend_url), Some(anon_key)) =
        (config.backend_url.clone(), config.anon_key.clone())
    else {
        eprintln!("Set {ENV_BACKEND_URL} and {ENV_ANON_KEY} before running the demo.");
        std::process::exit(1);
    };

    let client = Arc::new(RestAuthClient::with_options(
        &backend_url,
        &anon_key,
        ClientOptions::persistent(".authgate-session.json"),
    )?);
    tracing::debug!("Auth backend: {backend_url}");

    let store = SessionStore::connect(client.clone()).await;
    let _store_sub = store.subscribe(Box::new(|state| {
        let stack = active_stack(state);
        match state {
            SessionState::Authenticated(session) => {
                println!("==> signed in as {} ({stack:?} stack)", session.label)
            }
            SessionState::Unauthenticated => println!("==> signed out ({stack:?} stack)"),
            SessionState::Unknown => println!("==> resolving session ({stack:?} stack)"),
        }
    }));

    let password = PasswordFlow::new(config.clone(), client.clone());
    let oauth = OAuthFlow::new(config.clone(), client.clone(), Arc::new(PromptBrowser));

    println!("Commands:");
    println!("  sign-up EMAIL PASSWORD    create an account");
    println!("  sign-in EMAIL PASSWORD    password sign-in");
    println!("  resend EMAIL              resend the confirmation email");
    println!("  google                    OAuth sign-in via the browser");
    println!("  callback URL              deliver a redirect URL by hand");
    println!("  status | sign-out | quit");

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["sign-up", email, pw] => report(password.sign_up(email, pw).await),
            ["sign-in", email, pw] => report(password.sign_in(email, pw).await),
            ["resend", email] => match password.resend_confirmation(email).await {
                Ok(_) => println!("Confirmation email resent."),
                Err(error) => println!("{error}"),
            },
            ["google"] => report(oauth.sign_in(OAuthProvider::Google).await),
            ["callback", url] => report(oauth.handle_callback_url(url).await),
            ["status"] => println!("{:?}", store.state()),
            ["sign-out"] => store.sign_out().await,
            ["quit"] | ["exit"] => break,
            [] => {}
            _ => println!("Unrecognized command."),
        }
    }

    Ok(())
}

fn report(result: Result<FlowOutcome, FlowError>) {
    match result {
        // Completion and cancellation print nothing here; the store
        // subscription reports session changes
        Ok(FlowOutcome::Completed) | Ok(FlowOutcome::Cancelled) => {}
        Ok(FlowOutcome::CheckEmail { email }) => {
            println!("Check {email} for a confirmation link, then sign in.")
        }
        Err(error) => println!("{error}"),
    }
}
