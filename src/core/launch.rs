// ─── Launch Composer ───
// Turns a validated profile and a ready environment into the client's
// command line, spawns it and relays its output.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use sysinfo::Signal;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::bootstrap::ReadyEnvironment;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::Platform;
use crate::core::process;
use crate::core::profile::{LaunchProfile, STEAM_KEY};
use crate::core::settings::LauncherSettings;
use crate::core::steam::SteamProbe;

pub const MAIN_CLASS: &str = "com.wurmonline.client.launcherfx.WurmLaunchWrapper";
const LAUNCH_HASH_ARG: &str = "hash=firsthash";
const JAVAFX_EXPORTS: &[&str] = &[
    "--add-exports=javafx.web/com.sun.javafx.webkit=ALL-UNNAMED",
    "--add-exports=javafx.web/com.sun.webkit=ALL-UNNAMED",
    "--add-exports=javafx.web/com.sun.webkit.graphics=ALL-UNNAMED",
];
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);
const RELAY_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Non-fatal problems found while composing a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationWarning {
    SteamNotRunning,
}

impl fmt::Display for IntegrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationWarning::SteamNotRunning => {
                write!(f, "Steam is not running; launching without Steam integration")
            }
        }
    }
}

/// Fully assembled invocation. Nothing is spawned until [`LaunchPlan::spawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl LaunchPlan {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Copy-pasteable command line for logs.
    pub fn command_line(&self) -> String {
        let program = shell_escape(&self.program.to_string_lossy());
        let args = self
            .args
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ");

        if args.is_empty() {
            program
        } else {
            format!("{} {}", program, args)
        }
    }

    pub fn spawn(&self) -> LauncherResult<Child> {
        info!("Launching client with Java: {:?}", self.program);
        debug!("Command (copy/paste): {}", self.command_line());
        self.command().spawn().map_err(|source| LauncherError::Launch {
            program: self.program.clone(),
            source,
        })
    }
}

/// Build the launch plan without spawning anything.
pub fn compose(
    profile: &LaunchProfile,
    environment: &ReadyEnvironment,
    settings: &LauncherSettings,
    steam: &dyn SteamProbe,
    platform: &Platform,
) -> LauncherResult<(LaunchPlan, Vec<IntegrationWarning>)> {
    let resolved = profile.resolve(settings)?;
    let mut warnings = Vec::new();

    let mut rules = Vec::with_capacity(resolved.rules.len());
    for rule in resolved.rules {
        if rule.key == STEAM_KEY && !steam.is_running() {
            let warning = IntegrationWarning::SteamNotRunning;
            warn!("{}", warning);
            warnings.push(warning);
            continue;
        }
        rules.push(rule);
    }

    let mut args = resolved.preset_args;
    for rule in &rules {
        args.extend(rule.jvm_args.iter().map(|a| a.to_string()));
    }
    args.extend(resolved.heap_args);
    args.extend(resolved.java_args);

    args.push("--module-path".into());
    args.push(environment.javafx_lib.to_string_lossy().into_owned());
    args.push("--add-modules".into());
    args.push("ALL-MODULE-PATH".into());
    args.extend(JAVAFX_EXPORTS.iter().map(|a| a.to_string()));
    args.push("-cp".into());
    args.push(environment.client_jar.to_string_lossy().into_owned());
    args.push(MAIN_CLASS.into());
    for rule in &rules {
        args.extend(rule.client_args.iter().map(|a| a.to_string()));
    }
    args.push(LAUNCH_HASH_ARG.into());

    let library_var = platform.library_path_var();
    let mut env = vec![
        (
            "JAVA_HOME".to_string(),
            environment.java_home.to_string_lossy().into_owned(),
        ),
        (
            library_var.to_string(),
            append_env_path(
                std::env::var(library_var).ok(),
                &environment.jcef_dir.to_string_lossy(),
                platform.path_list_separator(),
            ),
        ),
    ];
    for rule in &rules {
        env.extend(rule.env.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    }

    let plan = LaunchPlan {
        program: environment.java_bin.clone(),
        args,
        env,
        cwd: environment.root.clone(),
    };
    Ok((plan, warnings))
}

/// Validate, compose and spawn. Validation errors are raised before any
/// process exists.
pub fn compose_and_launch(
    profile: &LaunchProfile,
    environment: &ReadyEnvironment,
    settings: &LauncherSettings,
    steam: &dyn SteamProbe,
    platform: &Platform,
) -> LauncherResult<LaunchHandle> {
    let (plan, warnings) = compose(profile, environment, settings, steam, platform)?;
    let mut child = plan.spawn()?;
    if let Some(pid) = child.id() {
        info!("Client running with pid {}", pid);
    }

    let stdout = child
        .stdout
        .take()
        .map(|out| tokio::spawn(relay(out, tokio::io::stdout())));
    let stderr = child
        .stderr
        .take()
        .map(|err| tokio::spawn(relay(err, tokio::io::stderr())));

    Ok(LaunchHandle {
        child,
        plan,
        warnings,
        relays: stdout.into_iter().chain(stderr).collect(),
        grace: INTERRUPT_GRACE,
    })
}

/// A running client.
pub struct LaunchHandle {
    child: Child,
    pub plan: LaunchPlan,
    pub warnings: Vec<IntegrationWarning>,
    relays: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl LaunchHandle {
    /// How long an interrupted client may take to exit before it is killed.
    pub fn with_interrupt_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Wait for the client to exit. Ctrl-C or SIGTERM is passed on to the
    /// client, which then gets a grace period before it is killed.
    pub async fn wait(self) -> LauncherResult<ExitStatus> {
        self.wait_or_interrupt(interrupted()).await
    }

    async fn wait_or_interrupt<F>(mut self, interrupt: F) -> LauncherResult<ExitStatus>
    where
        F: Future<Output = Signal>,
    {
        let program = self.plan.program.clone();
        let io_error = |source| LauncherError::Io {
            path: program.clone(),
            source,
        };

        let status = tokio::select! {
            status = self.child.wait() => status.map_err(io_error)?,
            signal = interrupt => {
                if let Some(pid) = self.child.id() {
                    if process::send_signal(pid, signal) {
                        debug!("Forwarded {:?} to the client (pid {})", signal, pid);
                    }
                }
                warn!("Interrupted; giving the client {:?} to exit", self.grace);
                match tokio::time::timeout(self.grace, self.child.wait()).await {
                    Ok(status) => status.map_err(io_error)?,
                    Err(_) => {
                        warn!("Client did not exit in time, killing it");
                        self.child.start_kill().map_err(io_error)?;
                        self.child.wait().await.map_err(io_error)?
                    }
                }
            }
        };

        for relay in self.relays.drain(..) {
            if tokio::time::timeout(RELAY_DRAIN_TIMEOUT, relay).await.is_err() {
                debug!("Output relay still busy after the client exited");
            }
        }

        info!("Client exited with {}", status);
        Ok(status)
    }
}

/// Process exit code the launcher should report for the client's status.
pub fn exit_code(status: &ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return (code & 0xff) as u8;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128u8.saturating_add((signal & 0x7f) as u8);
        }
    }
    1
}

async fn relay<R, W>(mut from: R, mut to: W)
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    if let Err(e) = tokio::io::copy(&mut from, &mut to).await {
        debug!("Output relay stopped: {}", e);
    }
}

/// Resolves with the signal received: Ctrl-C, or SIGTERM on unix. Never
/// resolves if the handlers cannot be installed.
async fn interrupted() -> Signal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_err() {
                        std::future::pending::<()>().await;
                    }
                    return Signal::Interrupt;
                }
                _ = term.recv() => return Signal::Term,
            }
        }
    }
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    Signal::Interrupt
}

fn append_env_path(existing: Option<String>, value: &str, separator: &str) -> String {
    match existing {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

/// POSIX-shell quoting: plain words stay bare, anything else is single-quoted.
fn shell_escape(raw: &str) -> String {
    let plain = !raw.is_empty()
        && raw.chars().all(|ch| {
            ch.is_ascii_alphanumeric()
                || matches!(ch, '-' | '_' | '.' | '/' | ':' | '=' | '+' | ',' | '@')
        });
    if plain {
        return raw.to_string();
    }
    format!("'{}'", raw.replace('\'', r"'\''"))
}
