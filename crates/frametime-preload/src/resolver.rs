//! Locating the real, non-instrumented entry points.
//!
//! This library exports its own `dlsym`, so every plain `dlsym` call in the
//! process (including one made from this crate through `libc::dlsym`) lands
//! in the interception wrapper. The real one is bootstrapped exactly once
//! through glibc's versioned `dlvsym`, which is not intercepted, and all
//! lookups below go through that pointer.

use std::ffi::CStr;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use frametime_core::error::{FrameError, FrameResult};
use frametime_core::kdebug;
use libc::{c_char, c_void};

use crate::gl::DlsymFn;

extern "C" {
    /// glibc's version-qualified lookup; not exported by this library
    fn dlvsym(handle: *mut c_void, symbol: *const c_char, version: *const c_char) -> *mut c_void;
}

// Symbol versions under which glibc has exported `dlsym`. 2.34 moved libdl
// into libc; older releases only carry the architecture's base version.
cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        const BASE_VERSION: &CStr = c"GLIBC_2.2.5";
    } else if #[cfg(target_arch = "aarch64")] {
        const BASE_VERSION: &CStr = c"GLIBC_2.17";
    } else if #[cfg(target_arch = "riscv64")] {
        const BASE_VERSION: &CStr = c"GLIBC_2.27";
    } else if #[cfg(target_arch = "x86")] {
        const BASE_VERSION: &CStr = c"GLIBC_2.0";
    } else {
        compile_error!("Unsupported architecture");
    }
}

const DLSYM_VERSIONS: [&CStr; 2] = [c"GLIBC_2.34", BASE_VERSION];

static REAL_DLSYM: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

/// The real `dlsym`, bootstrapped on first use
///
/// Safe to call before attach and from any thread; concurrent first calls
/// both resolve the same address.
pub fn real_dlsym() -> FrameResult<DlsymFn> {
    let mut p = REAL_DLSYM.load(Ordering::Acquire);
    if p.is_null() {
        p = bootstrap_dlsym().ok_or(FrameError::LookupBootstrap)?.as_ptr();
        REAL_DLSYM.store(p, Ordering::Release);
    }
    // Safety: p was returned by dlvsym for "dlsym" and is never null here
    Ok(unsafe { std::mem::transmute::<*mut c_void, DlsymFn>(p) })
}

fn bootstrap_dlsym() -> Option<NonNull<c_void>> {
    DLSYM_VERSIONS.iter().find_map(|version| {
        // Safety: both strings are NUL-terminated literals
        let p = unsafe { dlvsym(libc::RTLD_NEXT, c"dlsym".as_ptr(), version.as_ptr()) };
        NonNull::new(p)
    })
}

/// Resolve `name` as the next definition after this library, falling back
/// to opening `library` explicitly.
///
/// The fallback covers hosts that `dlopen` the graphics library themselves
/// after this shim attached, so it was not in the link map yet.
pub fn resolve(name: &CStr, library: &CStr) -> FrameResult<NonNull<c_void>> {
    let dlsym = real_dlsym()?;

    // Safety: name is NUL-terminated; RTLD_NEXT is relative to this object
    let next = unsafe {
        libc::dlerror();
        dlsym(libc::RTLD_NEXT, name.as_ptr())
    };
    if let Some(p) = NonNull::new(next) {
        kdebug!("{} resolved via RTLD_NEXT at {:p}", name.to_string_lossy(), p);
        return Ok(p);
    }

    // Safety: library is NUL-terminated; the handle is intentionally never
    // closed so the resolved address stays valid for the process lifetime
    let handle = unsafe { libc::dlopen(library.as_ptr(), libc::RTLD_LAZY) };
    if handle.is_null() {
        return Err(unresolved(name, library));
    }

    let found = unsafe {
        libc::dlerror();
        dlsym(handle, name.as_ptr())
    };
    match NonNull::new(found) {
        Some(p) => {
            kdebug!(
                "{} resolved from {} at {:p}",
                name.to_string_lossy(),
                library.to_string_lossy(),
                p
            );
            Ok(p)
        }
        None => Err(unresolved(name, library)),
    }
}

/// Look `name` up in the global scope (no `RTLD_NEXT` semantics)
pub fn lookup_default(name: &CStr) -> Option<NonNull<c_void>> {
    let dlsym = real_dlsym().ok()?;
    // Safety: name is NUL-terminated
    NonNull::new(unsafe { dlsym(libc::RTLD_DEFAULT, name.as_ptr()) })
}

fn unresolved(name: &CStr, library: &CStr) -> FrameError {
    FrameError::Unresolved {
        symbol: name.to_string_lossy().into_owned(),
        library: library.to_string_lossy().into_owned(),
        detail: last_dl_error(),
    }
}

fn last_dl_error() -> String {
    // Safety: dlerror returns NULL or a NUL-terminated thread-local string
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "symbol not found".to_string()
    } else {
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_finds_real_dlsym() {
        let dlsym = real_dlsym().expect("glibc exports a versioned dlsym");
        let again = real_dlsym().unwrap();
        assert_eq!(dlsym as usize, again as usize);
        assert_ne!(dlsym as usize, crate::interpose::dlsym as usize);
    }

    #[test]
    fn test_resolve_via_next() {
        let p = resolve(c"getpid", c"libc.so.6").expect("getpid is in libc");
        let getpid: unsafe extern "C" fn() -> libc::pid_t = unsafe { std::mem::transmute(p.as_ptr()) };
        assert_eq!(unsafe { getpid() }, std::process::id() as libc::pid_t);
    }

    #[test]
    fn test_resolve_missing_symbol_reports_library() {
        let err = resolve(c"frametime_no_such_symbol", c"libc.so.6").unwrap_err();
        match err {
            FrameError::Unresolved { symbol, library, .. } => {
                assert_eq!(symbol, "frametime_no_such_symbol");
                assert_eq!(library, "libc.so.6");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_resolve_missing_library_is_fatal() {
        let err = resolve(c"glXSwapBuffers_nope", c"libframetime-missing.so.0").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("libframetime-missing.so.0"));
    }
}
