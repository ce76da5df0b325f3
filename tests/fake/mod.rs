//! Scripted stand-ins for the engine binary.
//!
//! Each fake engine is a `sh` script in a temporary directory. The script
//! receives the real engine flags as positional arguments and can check
//! them to tell automatic runs from interactive ones.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use vampire_supervisor::config::EngineConfig;

/// Selects clauses 1 then 2 and finds a refutation. Under `--manual_cs on`
/// it asks for both selections; otherwise it picks them itself.
pub const REFUTING_ENGINE: &str = r#"
manual=0
case " $* " in *" --manual_cs on "*) manual=1 ;; esac
echo "% Running in auto input_syntax mode"
echo "[SA] new: 1. p(a) [input]"
echo "[SA] new: 2. ~p(a) [input]"
if [ $manual = 1 ]; then echo "Pick a clause from: 1,2,"; read c; else c=1; fi
echo "[SA] active: $c. selected"
if [ $manual = 1 ]; then echo "Pick a clause from: 2,"; read c; else c=2; fi
echo "[SA] active: $c. selected"
echo "[SA] new: 3. false [resolution 1,2]"
echo "% Refutation found. Thanks to Tanya!"
echo "% SZS status Unsatisfiable for problem"
echo "% SZS output start Proof for problem"
"#;

/// Offers one selection, echoes the choice, then saturates.
pub const SATURATING_ENGINE: &str = r#"
echo "% Running in manual clause selection mode"
echo "[SA] new: 1. p(a) [input]"
echo "[SA] new: 2. q(b) [input]"
echo "Pick a clause from: 2,1,"
read choice
echo "[SA] active: $choice"
echo "% SZS status Satisfiable for problem"
echo "% this line is never collected"
"#;

/// Waits for selections forever, echoing each one.
pub const LOOPING_ENGINE: &str = r#"
echo "% started"
while true; do
  echo "Pick a clause from: 4,5,"
  read c || exit 0
  echo "[SA] active: $c"
done
"#;

/// A prepared fake engine with a problem file next to it.
pub struct FakeEngine {
    _dir: TempDir,
    script: PathBuf,
    problem: PathBuf,
}

impl FakeEngine {
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("engine.sh");
        std::fs::write(&script_path, script).unwrap();
        let problem = dir.path().join("problem.smt2");
        std::fs::write(&problem, "(assert false)\n(check-sat)\n").unwrap();
        Self {
            _dir: dir,
            script: script_path,
            problem,
        }
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::with_launcher("sh", &[self.script.to_str().unwrap()])
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn problem(&self) -> &Path {
        &self.problem
    }
}

/// Returns true if a process with this id exists.
pub fn pid_alive(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
