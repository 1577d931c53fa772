use std::{
    fs,
    io::{self, BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    path::Path,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use inquire::Text;
use reqwest::Url;
use serde::Deserialize;
use uuid::Uuid;

use super::{
    credential::GOOGLE_TOKEN_URI, request_token, session::build_client, Credential, TokenResponse,
    SCOPES,
};
use crate::{debug, info, utils::logging::record, utils::shell::open_in_browser, warn};

const REDIRECT_PORT: u16 = 8080;
const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const SUCCESS_MESSAGE: &str = "The auth flow is complete; you may close this window.";

/// Browsers open connections they never send anything on
const READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_owned()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_owned()
}

impl ClientSecret {
    pub fn decode(input: &str) -> Result<Self> {
        let ClientSecretFile { installed, web } =
            serde_json::from_str(input).context("Failed to decode the client secret file")?;

        installed.or(web).context(
            "Client secret file must contain an 'installed' or 'web' application configuration",
        )
    }

    pub fn load_from_disk(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secret file: {}", path.display()))?;

        Self::decode(&content)
    }
}

/// Run the installed-app authorization flow
///
/// Returns the new credential along with the access token's lifetime in seconds
pub fn authorize(client_id_file: &Path) -> Result<(Credential, Option<u64>)> {
    let secret = ClientSecret::load_from_disk(client_id_file)?;
    let state = random_state();
    let redirect_uri = format!("http://localhost:{REDIRECT_PORT}/");

    let auth_url = authorization_url(&secret, &redirect_uri, &state)?;

    let code = match TcpListener::bind(("localhost", REDIRECT_PORT)) {
        Ok(listener) => {
            show_authorization_url(&auth_url)?;
            wait_for_code(&listener, &state)?
        }

        Err(err) => {
            warn!(
                "Cannot listen on port {} ({err}), the redirection will have to be copied by hand",
                REDIRECT_PORT.to_string().bright_yellow()
            );

            show_authorization_url(&auth_url)?;
            prompt_for_code(&state)?
        }
    };

    let http = build_client()?;

    let TokenResponse {
        access_token,
        expires_in,
        refresh_token,
        id_token,
        scope,
    } = request_token(
        &http,
        &secret.token_uri,
        &[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ],
    )
    .context("Failed to exchange the authorization code")?;

    let scopes = match scope {
        Some(scope) => scope.split_whitespace().map(str::to_owned).collect(),
        None => SCOPES.iter().map(|scope| (*scope).to_owned()).collect(),
    };

    let ClientSecret {
        client_id,
        client_secret,
        auth_uri: _,
        token_uri,
    } = secret;

    let credential = Credential {
        token: Some(access_token),
        refresh_token,
        id_token,
        scopes: Some(scopes),
        token_uri: Some(token_uri),
        client_id: Some(client_id),
        client_secret: Some(client_secret),
    };

    Ok((credential, expires_in))
}

fn authorization_url(secret: &ClientSecret, redirect_uri: &str, state: &str) -> Result<Url> {
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES.join(" ").as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .with_context(|| format!("Invalid authorization URI: {}", secret.auth_uri))
}

fn show_authorization_url(url: &Url) -> Result<()> {
    if let Err(err) = open_in_browser(url.as_str()) {
        debug!("{:#}", err);
        info!("Please visit this URL to authorize this application:");
    } else {
        info!("Your browser has been opened to visit:");
    }

    write_url(&mut io::stdout().lock(), url).context("Failed to display the authorization URL")
}

/// Write the URL in full, as the logging macros would cut it to the terminal's width
fn write_url(out: &mut impl Write, url: &Url) -> io::Result<()> {
    record("INFO", url.as_str());
    writeln!(out, "    {}", url.as_str().bright_magenta())
}

fn wait_for_code(listener: &TcpListener, state: &str) -> Result<String> {
    info!("Waiting for the authorization to complete...");

    for stream in listener.incoming() {
        let mut stream = stream.context("Failed to accept the redirection connection")?;

        if let Err(err) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            debug!("Ignoring connection without read timeout: {}", err);
            continue;
        }

        let target = match read_request_target(&mut stream) {
            Ok(target) => target,
            Err(err) => {
                debug!("Ignoring malformed request: {:#}", err);
                continue;
            }
        };

        match parse_redirect(&target, state) {
            Ok(Some(code)) => {
                respond(&mut stream, "200 OK", SUCCESS_MESSAGE);
                return Ok(code);
            }

            // Browsers also ask for things like '/favicon.ico'
            Ok(None) => respond(&mut stream, "404 Not Found", "Not found"),

            Err(err) => {
                respond(&mut stream, "400 Bad Request", &format!("{err:#}"));
                return Err(err);
            }
        }
    }

    bail!("Stopped listening before receiving the authorization")
}

fn read_request_target(stream: &mut TcpStream) -> Result<String> {
    let mut request_line = String::new();

    BufReader::new(&*stream)
        .read_line(&mut request_line)
        .context("Failed to read the request")?;

    let mut parts = request_line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_owned()),
        _ => bail!("Unexpected request: {}", request_line.trim()),
    }
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    if let Err(err) = stream.write_all(response.as_bytes()) {
        debug!("Failed to answer the browser: {}", err);
    }
}

/// Extract the authorization code from a redirection target (e.g. `/?state=...&code=...`)
///
/// Returns `None` for requests that are not an authorization redirection
fn parse_redirect(target: &str, expected_state: &str) -> Result<Option<String>> {
    let url = Url::parse("http://localhost/")
        .and_then(|base| base.join(target))
        .with_context(|| format!("Invalid redirection: {target}"))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        bail!("Authorization was refused: {error}");
    }

    let Some(code) = code else {
        return Ok(None);
    };

    if state.as_deref() != Some(expected_state) {
        bail!("Authorization state mismatch, the redirection was not issued for this request");
    }

    Ok(Some(code))
}

fn prompt_for_code(state: &str) -> Result<String> {
    let input = Text::new("Paste the URL your browser was redirected to (or the code):")
        .prompt()
        .context("Failed to setup or retrieve the authorization prompt")?;

    let input = input.trim();

    if input.is_empty() {
        bail!("No authorization code provided");
    }

    if !input.contains("code=") {
        return Ok(input.to_owned());
    }

    let target = match Url::parse(input) {
        Ok(url) => format!("/?{}", url.query().unwrap_or_default()),
        Err(_) => input.to_owned(),
    };

    parse_redirect(&target, state)?.ok_or_else(|| anyhow!("No authorization code found in: {input}"))
}

fn random_state() -> String {
    Uuid::new_v4().simple().to_string()
}
