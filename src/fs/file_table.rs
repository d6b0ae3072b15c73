// SPDX-License-Identifier: MPL-2.0

use super::file_handle::FileLike;
use crate::prelude::*;

/// A small per-process integer naming one slot of the file table.
pub type Fid = usize;

/// The fixed number of file-id slots every process has.
pub const MAX_FILEID: usize = 16;

/// The file record behind a fid: one refcounted handle on a stream.
///
/// Several fids — in one process (`dup2`) or across processes (descriptor
/// inheritance) — may share one record. When the last of them goes, the
/// record runs the stream's close operation. Operations in flight hold
/// the stream *object* instead, so a close never races them out from
/// under their feet but is also never delayed by them.
pub struct FileEntry {
    file: Arc<dyn FileLike>,
}

impl FileEntry {
    fn new(file: Arc<dyn FileLike>) -> Arc<Self> {
        Arc::new(Self { file })
    }

    pub fn file(&self) -> &Arc<dyn FileLike> {
        &self.file
    }
}

impl Drop for FileEntry {
    fn drop(&mut self) {
        self.file.close();
    }
}

impl core::fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FileEntry").finish()
    }
}

/// The per-process table mapping file ids to open streams.
pub struct FileTable {
    slots: [Option<Arc<FileEntry>>; MAX_FILEID],
}

impl FileTable {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Puts `file` into the lowest free slot and returns its fid.
    pub fn insert(&mut self, file: Arc<dyn FileLike>) -> Result<Fid> {
        let fid = self
            .first_free(0)
            .ok_or(Error::with_message(Errno::EMFILE, "no free file id"))?;
        self.slots[fid] = Some(FileEntry::new(file));
        Ok(fid)
    }

    /// Reserves two fids at once, or fails without taking either.
    pub fn insert_pair(
        &mut self,
        first: Arc<dyn FileLike>,
        second: Arc<dyn FileLike>,
    ) -> Result<(Fid, Fid)> {
        let a = self
            .first_free(0)
            .ok_or(Error::with_message(Errno::EMFILE, "no free file id"))?;
        let b = self
            .first_free(a + 1)
            .ok_or(Error::with_message(Errno::EMFILE, "only one free file id"))?;
        self.slots[a] = Some(FileEntry::new(first));
        self.slots[b] = Some(FileEntry::new(second));
        Ok((a, b))
    }

    /// Resolves a fid to its stream object.
    pub fn get(&self, fid: Fid) -> Result<Arc<dyn FileLike>> {
        self.slots
            .get(fid)
            .and_then(|slot| slot.as_ref())
            .map(|entry| entry.file.clone())
            .ok_or(Error::with_message(Errno::EBADF, "no open file at the fid"))
    }

    /// Empties the slot. The removed record is returned so the caller can
    /// drop it — and thereby possibly run the close — after releasing the
    /// table lock.
    pub fn close(&mut self, fid: Fid) -> Result<Arc<FileEntry>> {
        if fid >= MAX_FILEID {
            return_errno_with_message!(Errno::EBADF, "the fid is out of range");
        }
        self.slots[fid]
            .take()
            .ok_or(Error::with_message(Errno::EBADF, "no open file at the fid"))
    }

    /// Makes `new` refer to the record at `old`.
    ///
    /// Whatever was open at `new` is returned for the caller to drop;
    /// `old == new` is a no-op.
    pub fn dup2(&mut self, old: Fid, new: Fid) -> Result<Option<Arc<FileEntry>>> {
        if new >= MAX_FILEID {
            return_errno_with_message!(Errno::EBADF, "the target fid is out of range");
        }
        let entry = self
            .slots
            .get(old)
            .and_then(|slot| slot.clone())
            .ok_or(Error::with_message(Errno::EBADF, "no open file at the fid"))?;
        if old == new {
            return Ok(None);
        }
        Ok(self.slots[new].replace(entry))
    }

    /// Empties every slot, returning the removed records for deferred drop.
    pub fn close_all(&mut self) -> Vec<Arc<FileEntry>> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    pub fn has_free_slot(&self) -> bool {
        self.first_free(0).is_some()
    }

    /// The copy a newly spawned child starts from: same records, shared.
    pub fn clone_for_spawn(&self) -> FileTable {
        FileTable {
            slots: self.slots.clone(),
        }
    }

    fn first_free(&self, from: Fid) -> Option<Fid> {
        (from..MAX_FILEID).find(|&fid| self.slots[fid].is_none())
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}
