use crate::error::{Result, SessionError};
use pure_ide_protocol::{is_under_path, normalize_line_endings, FileCoordinate, OpenFileRequest};

/// An open editor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuffer {
    pub path: String,
    pub content: String,
    /// Cursor or error location to reveal when the tab is shown.
    pub coordinate: Option<FileCoordinate>,
}

/// Open tabs in opening order plus the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    files: Vec<FileBuffer>,
    current: Option<usize>,
}

impl Workspace {
    pub fn files(&self) -> &[FileBuffer] {
        &self.files
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }

    pub fn file(&self, path: &str) -> Option<&FileBuffer> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    pub fn current(&self) -> Option<&FileBuffer> {
        self.current.and_then(|idx| self.files.get(idx))
    }

    /// Focuses `path`, opening it with `content` if it isn't open yet.
    ///
    /// An existing buffer keeps its content; only the coordinate is updated
    /// when one is given.
    pub fn open(&mut self, path: &str, content: String, coordinate: Option<FileCoordinate>) {
        match self.position(path) {
            Some(idx) => {
                if coordinate.is_some() {
                    self.files[idx].coordinate = coordinate;
                }
                self.current = Some(idx);
            }
            None => {
                self.files.push(FileBuffer {
                    path: path.to_string(),
                    content,
                    coordinate,
                });
                self.current = Some(self.files.len() - 1);
            }
        }
    }

    /// Focuses an already open buffer. Returns false when `path` isn't open.
    pub fn focus(&mut self, path: &str, coordinate: Option<FileCoordinate>) -> bool {
        let Some(idx) = self.position(path) else {
            return false;
        };
        if coordinate.is_some() {
            self.files[idx].coordinate = coordinate;
        }
        self.current = Some(idx);
        true
    }

    /// Replaces the buffer content from an editor edit.
    pub fn set_content(&mut self, path: &str, content: String) -> Result<()> {
        let idx = self.require(path)?;
        self.files[idx].content = content;
        Ok(())
    }

    /// Replaces content with the server copy and forgets the coordinate.
    pub fn reload(&mut self, path: &str, content: String) -> bool {
        match self.position(path) {
            Some(idx) => {
                let file = &mut self.files[idx];
                file.content = content;
                file.coordinate = None;
                true
            }
            None => false,
        }
    }

    /// Closes a tab. The tab to its left (or the first one) becomes active.
    pub fn close(&mut self, path: &str) -> Result<()> {
        let idx = self.require(path)?;
        self.files.remove(idx);
        self.current = match self.current {
            _ if self.files.is_empty() => None,
            Some(current) if current == idx => Some(idx.saturating_sub(1)),
            Some(current) if current > idx => Some(current - 1),
            other => other,
        };
        Ok(())
    }

    pub fn close_all_others(&mut self, path: &str) -> Result<()> {
        let idx = self.require(path)?;
        let keep = self.files.swap_remove(idx);
        self.files = vec![keep];
        self.current = Some(0);
        Ok(())
    }

    pub fn close_all(&mut self) {
        self.files.clear();
        self.current = None;
    }

    /// Open buffers under `root`, in tab order.
    pub fn paths_under(&self, root: &str) -> Vec<String> {
        self.files
            .iter()
            .filter(|file| is_under_path(root, &file.path))
            .map(|file| file.path.clone())
            .collect()
    }

    /// Request payload for an execution: every open buffer with `\n` line endings.
    pub fn open_files_request(&self) -> Vec<OpenFileRequest> {
        self.files
            .iter()
            .map(|file| OpenFileRequest {
                path: file.path.clone(),
                code: normalize_line_endings(&file.content),
            })
            .collect()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|file| file.path == path)
    }

    fn require(&self, path: &str) -> Result<usize> {
        self.position(path).ok_or_else(|| {
            SessionError::IllegalState(format!("Can't close a tab which is not opened: {path}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workspace(paths: &[&str]) -> Workspace {
        let mut workspace = Workspace::default();
        for path in paths {
            workspace.open(path, format!("// {path}\r\n"), None);
        }
        workspace
    }

    #[test]
    fn closing_active_tab_focuses_left_neighbour() {
        let mut ws = workspace(&["/a.pure", "/b.pure", "/c.pure"]);
        ws.focus("/b.pure", None);
        ws.close("/b.pure").expect("close");
        assert_eq!(ws.current().map(|f| f.path.as_str()), Some("/a.pure"));

        ws.focus("/a.pure", None);
        ws.close("/a.pure").expect("close");
        assert_eq!(ws.current().map(|f| f.path.as_str()), Some("/c.pure"));

        ws.close("/c.pure").expect("close");
        assert!(ws.current().is_none());
    }

    #[test]
    fn closing_unopened_tab_is_illegal() {
        let mut ws = workspace(&["/a.pure"]);
        assert!(matches!(ws.close("/x.pure"), Err(SessionError::IllegalState(_))));
        assert!(matches!(ws.close_all_others("/x.pure"), Err(SessionError::IllegalState(_))));
    }

    #[test]
    fn close_all_others_keeps_one() {
        let mut ws = workspace(&["/a.pure", "/b.pure", "/c.pure"]);
        ws.close_all_others("/a.pure").expect("close others");
        assert_eq!(ws.paths(), vec!["/a.pure".to_string()]);
        assert_eq!(ws.current().map(|f| f.path.as_str()), Some("/a.pure"));
    }

    #[test]
    fn request_payload_normalizes_line_endings() {
        let ws = workspace(&["/a.pure"]);
        let request = ws.open_files_request();
        assert_eq!(request[0].code, "// /a.pure\n");
        assert_eq!(ws.file("/a.pure").map(|f| f.content.as_str()), Some("// /a.pure\r\n"));
    }

    #[test]
    fn reopening_keeps_buffer_content() {
        let mut ws = workspace(&["/a.pure"]);
        ws.set_content("/a.pure", "edited".to_string()).expect("edit");
        let coordinate = FileCoordinate::new("/a.pure", 2, 3).expect("coordinate");
        ws.open("/a.pure", "server".to_string(), Some(coordinate.clone()));
        let file = ws.file("/a.pure").expect("file");
        assert_eq!(file.content, "edited");
        assert_eq!(file.coordinate, Some(coordinate));

        assert!(ws.reload("/a.pure", "server".to_string()));
        assert_eq!(ws.file("/a.pure").and_then(|f| f.coordinate.clone()), None);
    }

    #[test]
    fn paths_under_respects_segments() {
        let ws = workspace(&["/core/a.pure", "/core2/b.pure", "/core/sub/c.pure"]);
        assert_eq!(
            ws.paths_under("/core"),
            vec!["/core/a.pure".to_string(), "/core/sub/c.pure".to_string()]
        );
    }
}
