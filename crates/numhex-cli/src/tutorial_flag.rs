use std::{
    fs,
    path::{Path, PathBuf},
};

use numhex_engine::TutorialFlag;

const FLAG_FILE: &str = "tutorial_completed";

/// Tutorial flag stored as a marker file in the state directory.
///
/// Write failures are logged and leave the flag unset for the next run.
#[derive(Debug, Clone)]
pub struct FileTutorialFlag {
    path: PathBuf,
    completed: bool,
}

impl FileTutorialFlag {
    pub fn open(state_dir: &Path) -> Self {
        let path = state_dir.join(FLAG_FILE);
        let completed = path.is_file();
        Self { path, completed }
    }
}

impl TutorialFlag for FileTutorialFlag {
    fn is_completed(&self) -> bool {
        self.completed
    }

    fn mark_completed(&mut self) {
        self.completed = true;
        let result = self
            .path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&self.path, b"1\n"));
        if let Err(e) = result {
            log::warn!("cannot save {}: {e}", self.path.display());
        }
    }
}
