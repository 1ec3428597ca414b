//! # Remote Repository Bootstrap
//!
//! `new` mode turns a plain local directory into a repository backed by a
//! freshly created remote one. The remote side is provisioned by copying a
//! template repository on the remote host; the local side is initialized if
//! needed, configured, wired to `origin` and, when it had no history yet,
//! checked out at the remote's default branch.
//!
//! The remote host is reached through a [`Transport`] and the operator is
//! asked through a [`Confirmer`], so both can be replaced in tests.

use std::io::Write;
use std::process::{Command, Stdio};

use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::Confirm;
use log::{debug, info};
use url::Url;

use crate::config::ConfigSnapshot;
use crate::defaults::{keys, LOOPBACK_LOGIN};
use crate::error::{Error, Result};
use crate::path::{cat_path, with_git_suffix};
use crate::remote::parse_login;
use crate::repository::GitOperations;
use crate::state::RepoContext;

/// Settings that must be defined before anything is created.
pub const REQUIRED_SETTINGS: [&str; 3] = [keys::RPATH_TEMPLATE, keys::RLOGIN, keys::RPATH_BASE];

const EXIT_NOT_REPO: i32 = 90;
const EXIT_IS_FILE: i32 = 91;
const EXIT_OTHER_FILETYPE: i32 = 92;

/// Creates repositories on a remote host.
pub trait Transport: Send + Sync {
    /// Make sure a repository exists at `target` on the host named by
    /// `login`, copying it from `template` if it does not.
    fn create_remote(&self, login: &Url, target: &str, template: &str) -> Result<()>;
}

/// Asks the operator before anything is created.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Quote a string for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// The script run on the remote host.
///
/// An existing repository at the target is accepted, any other existing
/// file refused with a distinct exit status. An empty template creates an
/// empty bare repository instead of copying.
pub fn provision_script(target: &str, template: &str) -> String {
    format!(
        r#"set -e
target={target}
template={template}
if [ -d "$target" ]; then
    if git -C "$target" rev-parse --git-dir >/dev/null 2>&1; then
        exit 0
    fi
    exit {EXIT_NOT_REPO}
elif [ -f "$target" ]; then
    exit {EXIT_IS_FILE}
elif [ -e "$target" ] || [ -L "$target" ]; then
    exit {EXIT_OTHER_FILETYPE}
fi
if [ -z "$template" ]; then
    mkdir -p "$target"
    git -C "$target" init --bare -q
else
    mkdir -p "$(dirname "$target")"
    cp -na --reflink=auto "$template" "$target"
fi
"#,
        target = shell_quote(target),
        template = shell_quote(template),
    )
}

/// Map the exit status of [`provision_script`] to a result.
fn provision_result(target: &str, code: Option<i32>) -> Result<()> {
    let message = match code {
        Some(0) => return Ok(()),
        Some(EXIT_NOT_REPO) => "target directory exists but is not a Git repository".to_string(),
        Some(EXIT_IS_FILE) => "target exists as a regular file".to_string(),
        Some(EXIT_OTHER_FILETYPE) => {
            "target exists as a special file (symlink, device, pipe or socket)".to_string()
        }
        Some(code) => format!("remote command exited with status {}", code),
        None => "remote command was terminated by a signal".to_string(),
    };
    Err(Error::Bootstrap {
        target: target.to_string(),
        message,
    })
}

/// Runs [`provision_script`] through `ssh <host> sh -s`.
#[derive(Debug, Clone, Default)]
pub struct SshTransport;

impl SshTransport {
    fn destination(login: &Url) -> Result<String> {
        let host = login.host_str().filter(|h| !h.is_empty()).ok_or_else(|| Error::Bootstrap {
            target: login.to_string(),
            message: "login has no host".to_string(),
        })?;
        Ok(if login.username().is_empty() {
            host.to_string()
        } else {
            format!("{}@{}", login.username(), host)
        })
    }
}

impl Transport for SshTransport {
    fn create_remote(&self, login: &Url, target: &str, template: &str) -> Result<()> {
        let destination = Self::destination(login)?;
        let mut command = Command::new("ssh");
        if let Some(port) = login.port() {
            command.args(["-p", &port.to_string()]);
        }
        command.args([destination.as_str(), "sh", "-s"]);
        debug!("Provisioning {} on {} over ssh", target, destination);

        let mut child = command
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Bootstrap {
                target: target.to_string(),
                message: format!("could not start ssh: {}", e),
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(provision_script(target, template).as_bytes())?;
        }
        let status = child.wait()?;
        provision_result(target, status.code())
    }
}

/// Interactive confirmation on the terminal.
pub struct DialoguerConfirmer {
    colored: bool,
}

impl DialoguerConfirmer {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }
}

impl Confirmer for DialoguerConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let colorful = ColorfulTheme::default();
        let theme: &dyn Theme = if self.colored { &colorful } else { &SimpleTheme };
        Ok(Confirm::with_theme(theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

/// Confirms everything, for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        info!("{} yes", prompt);
        Ok(true)
    }
}

/// How a bootstrap ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    /// The operator declined.
    Aborted,
}

/// Creates the remote repository for a plain directory and wires it up.
pub struct Bootstrapper {
    transport: Box<dyn Transport>,
    confirmer: Box<dyn Confirmer>,
}

impl Bootstrapper {
    pub fn new(transport: Box<dyn Transport>, confirmer: Box<dyn Confirmer>) -> Self {
        Self {
            transport,
            confirmer,
        }
    }

    pub fn bootstrap(&self, ctx: &RepoContext, git: &dyn GitOperations) -> Result<Outcome> {
        let config = &ctx.snapshot;
        check_settings(config)?;

        let base = config.str_or_empty(keys::RPATH_BASE);
        let target = with_git_suffix(&cat_path(&[base, &ctx.remote_path]));
        let template = match config.str_or_empty(keys::RPATH_TEMPLATE) {
            "" => String::new(),
            template => cat_path(&[base, template]),
        };
        let login = bootstrap_login(config.str_or_empty(keys::RLOGIN), &target)?;

        let prompt = format!("About to create remote repo '{}'; are you sure?", target);
        if !self.confirmer.confirm(&prompt)? {
            info!("(aborted)");
            return Ok(Outcome::Aborted);
        }

        info!("Creating {} on {}", target, login);
        self.transport.create_remote(&login, &target, &template)?;

        let dir = &ctx.abs_local;
        let virgin = !git.is_repo_root(dir)?;
        if virgin {
            git.init(dir)?;
        }
        ctx.configure(git)?;

        let url = format!(
            "{}/{}",
            login.as_str().trim_end_matches('/'),
            target.trim_start_matches('/')
        );
        if git.origin_url(dir)?.is_some() {
            git.set_origin_url(dir, &url)?;
            git.fetch_origin(dir)?;
        } else {
            git.add_origin(dir, &url)?;
        }

        if virgin {
            if git.remote_branches(dir)?.is_empty() {
                info!("{}: remote has no branches yet, nothing to check out", ctx.display_path());
            } else {
                let branch = git.remote_default_branch(dir)?;
                git.checkout_branch(dir, &branch)?;
            }
        }
        Ok(Outcome::Created)
    }
}

/// Fail with every required setting that is not defined.
pub fn check_settings(config: &ConfigSnapshot) -> Result<()> {
    let missing: Vec<String> = REQUIRED_SETTINGS
        .iter()
        .filter(|key| !config.is_defined(key))
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingSettings { keys: missing })
    }
}

/// Parse the login used to reach the remote host. An empty login means the
/// local machine over ssh.
fn bootstrap_login(raw: &str, target: &str) -> Result<Url> {
    let raw = if raw.is_empty() { LOOPBACK_LOGIN } else { raw };
    let login = parse_login(raw).ok_or_else(|| Error::Bootstrap {
        target: target.to_string(),
        message: format!("{} '{}' needs an explicit scheme such as ssh://", keys::RLOGIN, raw),
    })?;
    if login.scheme() != "ssh" {
        return Err(Error::Bootstrap {
            target: target.to_string(),
            message: format!(
                "only ssh logins can create remote repositories, not '{}'",
                login.scheme()
            ),
        });
    }
    Ok(login)
}
