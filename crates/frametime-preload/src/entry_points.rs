//! The real presentation and address-query entry points.
//!
//! Resolved once at attach, then read-only for the life of the process.
//! Each presentation API is resolved as a group: a host that only has
//! `libEGL` (or only `libGL`) still attaches, with the other group empty.
//! Attach fails only when neither API can be resolved, and a wrapper of an
//! empty group terminates the process instead of calling through nothing.

use std::ffi::CStr;
use std::ptr::{self, NonNull};

use frametime_core::error::{FrameError, FrameResult};
use frametime_core::kinfo;
use libc::c_void;

use crate::gl::{EglGetProcAddressFn, EglSwapBuffersFn, GlxGetProcAddressFn, GlxSwapBuffersFn};
use crate::resolver;

pub const LIBGL: &CStr = c"libGL.so.1";
pub const LIBEGL: &CStr = c"libEGL.so.1";

/// Presentation API a frame arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Glx,
    Egl,
}

impl Api {
    pub fn name(&self) -> &'static str {
        match self {
            Api::Glx => "GLX",
            Api::Egl => "EGL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GlxEntryPoints {
    pub swap_buffers: GlxSwapBuffersFn,
    pub get_proc_address: GlxGetProcAddressFn,
    pub get_proc_address_arb: GlxGetProcAddressFn,
}

#[derive(Debug, Clone, Copy)]
pub struct EglEntryPoints {
    pub swap_buffers: EglSwapBuffersFn,
    pub get_proc_address: EglGetProcAddressFn,
}

/// Real (non-instrumented) function addresses, per API
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    glx: Option<GlxEntryPoints>,
    egl: Option<EglEntryPoints>,
}

impl EntryPoints {
    /// Resolve both APIs through the dynamic linker
    pub fn resolve() -> FrameResult<Self> {
        // Safety: the dynamic linker returns the named symbols
        unsafe { Self::resolve_with(resolver::resolve) }
    }

    /// Resolve both APIs through `lookup(name, fallback_library)`
    ///
    /// A failing API is logged and left empty; the error is returned only
    /// when both fail.
    ///
    /// # Safety
    /// Every address `lookup` returns must be the named function, with the
    /// signature its header declares.
    pub unsafe fn resolve_with<R>(lookup: R) -> FrameResult<Self>
    where
        R: Fn(&CStr, &CStr) -> FrameResult<NonNull<c_void>>,
    {
        let glx = resolve_glx(&lookup);
        let egl = resolve_egl(&lookup);

        match (glx, egl) {
            (Err(e), Err(_)) => Err(e),
            (glx, egl) => {
                if let Err(e) = &glx {
                    kinfo!("{} timing unavailable: {}", Api::Glx.name(), e);
                }
                if let Err(e) = &egl {
                    kinfo!("{} timing unavailable: {}", Api::Egl.name(), e);
                }
                Ok(Self { glx: glx.ok(), egl: egl.ok() })
            }
        }
    }

    pub fn new(glx: Option<GlxEntryPoints>, egl: Option<EglEntryPoints>) -> Self {
        Self { glx, egl }
    }

    /// GLX functions, or `ApiUnavailable` if GLX was not resolved
    pub fn glx(&self) -> FrameResult<&GlxEntryPoints> {
        self.glx.as_ref().ok_or(FrameError::ApiUnavailable(Api::Glx.name()))
    }

    /// EGL functions, or `ApiUnavailable` if EGL was not resolved
    pub fn egl(&self) -> FrameResult<&EglEntryPoints> {
        self.egl.as_ref().ok_or(FrameError::ApiUnavailable(Api::Egl.name()))
    }

    /// Address of a GL function for a context created through `api`
    ///
    /// Asks the API's real address query first, then the global scope.
    /// Returns null when neither knows the name.
    pub fn gl_proc_address(&self, api: Api, name: &CStr) -> *mut c_void {
        // Safety: name is NUL-terminated and both queries accept any name
        let p = unsafe {
            match api {
                Api::Glx => self.glx.map_or(ptr::null_mut(), |g| (g.get_proc_address)(name.as_ptr().cast())),
                Api::Egl => self.egl.map_or(ptr::null_mut(), |e| (e.get_proc_address)(name.as_ptr())),
            }
        };
        if !p.is_null() {
            return p;
        }
        resolver::lookup_default(name).map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

unsafe fn resolve_glx<R>(lookup: &R) -> FrameResult<GlxEntryPoints>
where
    R: Fn(&CStr, &CStr) -> FrameResult<NonNull<c_void>>,
{
    Ok(GlxEntryPoints {
        swap_buffers: cast(lookup(c"glXSwapBuffers", LIBGL)?),
        get_proc_address: cast(lookup(c"glXGetProcAddress", LIBGL)?),
        get_proc_address_arb: cast(lookup(c"glXGetProcAddressARB", LIBGL)?),
    })
}

unsafe fn resolve_egl<R>(lookup: &R) -> FrameResult<EglEntryPoints>
where
    R: Fn(&CStr, &CStr) -> FrameResult<NonNull<c_void>>,
{
    Ok(EglEntryPoints {
        swap_buffers: cast(lookup(c"eglSwapBuffers", LIBEGL)?),
        get_proc_address: cast(lookup(c"eglGetProcAddress", LIBEGL)?),
    })
}

/// Reinterpret a resolved address as a function pointer
///
/// # Safety
/// `F` must be a function pointer type matching the symbol's real signature.
unsafe fn cast<F: Copy>(p: NonNull<c_void>) -> F {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
    std::mem::transmute_copy(&p.as_ptr())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gl::{EGLBoolean, EGLDisplay, EGLSurface, GLXDrawable, GLubyte, XDisplay};
    use libc::c_char;

    unsafe extern "C" fn fake_glx_swap(_: *mut XDisplay, _: GLXDrawable) {}

    unsafe extern "C" fn fake_egl_swap(_: EGLDisplay, _: EGLSurface) -> EGLBoolean {
        1
    }

    unsafe extern "C" fn null_glx_gpa(_: *const GLubyte) -> *mut c_void {
        ptr::null_mut()
    }

    unsafe extern "C" fn null_egl_gpa(_: *const c_char) -> *mut c_void {
        ptr::null_mut()
    }

    unsafe extern "C" fn marker_egl_gpa(_: *const c_char) -> *mut c_void {
        0x1000 as *mut c_void
    }

    fn inert_glx() -> GlxEntryPoints {
        GlxEntryPoints {
            swap_buffers: fake_glx_swap,
            get_proc_address: null_glx_gpa,
            get_proc_address_arb: null_glx_gpa,
        }
    }

    fn inert_egl() -> EglEntryPoints {
        EglEntryPoints { swap_buffers: fake_egl_swap, get_proc_address: null_egl_gpa }
    }

    /// Table whose presentation calls do nothing and whose address queries
    /// know no names
    pub(crate) fn inert_entry_points() -> EntryPoints {
        EntryPoints::new(Some(inert_glx()), Some(inert_egl()))
    }

    /// Lookup that only knows the EGL library, like a Wayland-only host
    fn egl_only_lookup(name: &CStr, library: &CStr) -> FrameResult<NonNull<c_void>> {
        let p = match name.to_bytes() {
            b"eglSwapBuffers" => fake_egl_swap as usize,
            b"eglGetProcAddress" => marker_egl_gpa as usize,
            _ => {
                return Err(FrameError::Unresolved {
                    symbol: name.to_string_lossy().into_owned(),
                    library: library.to_string_lossy().into_owned(),
                    detail: "cannot open shared object file".into(),
                })
            }
        };
        Ok(NonNull::new(p as *mut c_void).unwrap())
    }

    #[test]
    fn test_one_missing_api_still_attaches() {
        let ep = unsafe { EntryPoints::resolve_with(egl_only_lookup) }.unwrap();
        assert!(ep.egl().is_ok());
        assert_eq!(ep.glx().unwrap_err(), FrameError::ApiUnavailable("GLX"));
        assert!(ep.glx().unwrap_err().is_fatal());

        let egl = ep.egl().unwrap();
        assert_eq!(egl.swap_buffers as usize, fake_egl_swap as usize);
        assert_eq!(ep.gl_proc_address(Api::Egl, c"glGenQueriesEXT") as usize, 0x1000);
    }

    #[test]
    fn test_both_missing_fails_attach() {
        let err = unsafe {
            EntryPoints::resolve_with(|name: &CStr, library: &CStr| {
                Err(FrameError::Unresolved {
                    symbol: name.to_string_lossy().into_owned(),
                    library: library.to_string_lossy().into_owned(),
                    detail: String::new(),
                })
            })
        }
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("libGL.so.1"));
    }

    #[test]
    fn test_gl_proc_address_prefers_api_query() {
        let mut egl = inert_egl();
        egl.get_proc_address = marker_egl_gpa;
        let ep = EntryPoints::new(Some(inert_glx()), Some(egl));
        assert_eq!(ep.gl_proc_address(Api::Egl, c"glGenQueriesEXT") as usize, 0x1000);
    }

    #[test]
    fn test_gl_proc_address_falls_back_to_global_scope() {
        let ep = EntryPoints::new(None, Some(inert_egl()));
        assert!(!ep.gl_proc_address(Api::Glx, c"getpid").is_null());
        assert!(ep.gl_proc_address(Api::Egl, c"frametime_no_such_gl_function").is_null());
    }
}
