//! The ownership and permission mutations, routed through either the nix or the rustix backend.
//! Both backends take [None] in place of a UID or GID to leave that attribute untouched.

#[cfg(not(feature = "rustix-syscall-backend"))]
mod imp_nix {
    use std::path::Path;

    use nix::{
        fcntl::AtFlags,
        sys::stat::{FchmodatFlags, Mode},
        unistd::{Gid, Uid},
    };

    #[inline]
    pub fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), std::io::Error> {
        nix::unistd::chown(path, uid.map(Uid::from_raw), gid.map(Gid::from_raw)).map_err(std::io::Error::from)
    }

    #[inline]
    pub fn lchown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), std::io::Error> {
        nix::unistd::fchownat(
            None,
            path,
            uid.map(Uid::from_raw),
            gid.map(Gid::from_raw),
            AtFlags::AT_SYMLINK_NOFOLLOW,
        )
        .map_err(std::io::Error::from)
    }

    #[inline]
    pub fn chmod(path: &Path, mode: u32) -> Result<(), std::io::Error> {
        nix::sys::stat::fchmodat(
            None,
            path,
            Mode::from_bits_truncate(mode as nix::libc::mode_t),
            FchmodatFlags::FollowSymlink,
        )
        .map_err(std::io::Error::from)
    }
}

#[cfg(feature = "rustix-syscall-backend")]
mod imp_rustix {
    use std::path::Path;

    use rustix::fs::{AtFlags, CWD, Gid, Mode, Uid};

    #[inline]
    pub fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), std::io::Error> {
        rustix::fs::chown(path, to_uid(uid), to_gid(gid))
            .map_err(|errno| std::io::Error::from_raw_os_error(errno.raw_os_error()))
    }

    #[inline]
    pub fn lchown(path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), std::io::Error> {
        rustix::fs::chownat(CWD, path, to_uid(uid), to_gid(gid), AtFlags::SYMLINK_NOFOLLOW)
            .map_err(|errno| std::io::Error::from_raw_os_error(errno.raw_os_error()))
    }

    #[inline]
    pub fn chmod(path: &Path, mode: u32) -> Result<(), std::io::Error> {
        rustix::fs::chmod(path, Mode::from_bits_truncate(mode as rustix::fs::RawMode))
            .map_err(|errno| std::io::Error::from_raw_os_error(errno.raw_os_error()))
    }

    #[inline]
    fn to_uid(uid: Option<u32>) -> Option<Uid> {
        uid.map(|uid| unsafe { Uid::from_raw(uid) })
    }

    #[inline]
    fn to_gid(gid: Option<u32>) -> Option<Gid> {
        gid.map(|gid| unsafe { Gid::from_raw(gid) })
    }
}

#[cfg(feature = "rustix-syscall-backend")]
pub use imp_rustix::*;

#[cfg(not(feature = "rustix-syscall-backend"))]
pub use imp_nix::*;
