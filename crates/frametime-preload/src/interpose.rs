//! Exported replacements for the intercepted entry points.
//!
//! A host can reach a presentation function three ways: normal symbol
//! binding, `dlsym` by name, or an extension-address query. All three land
//! on the same wrapper here. Presentation wrappers time the frame first,
//! then forward their arguments and return value untouched.
//!
//! Known limitation: an application's own `dlsym(RTLD_NEXT, ..)` is
//! resolved relative to this library, not to the caller's object.

use std::ffi::CStr;

use frametime_core::die;
use frametime_core::error::FrameResult;
use libc::{c_char, c_void};

use crate::entry_points::Api;
use crate::gl::{EGLBoolean, EGLDisplay, EGLSurface, GLXDrawable, GLubyte, XDisplay};
use crate::{resolver, state};

/// Wrapper address for an intercepted symbol name
///
/// Shared by every lookup path so they cannot disagree.
pub fn intercepted(name: &[u8]) -> Option<*mut c_void> {
    let wrapper = match name {
        b"glXSwapBuffers" => glXSwapBuffers as usize,
        b"eglSwapBuffers" => eglSwapBuffers as usize,
        b"glXGetProcAddress" => glXGetProcAddress as usize,
        b"glXGetProcAddressARB" => glXGetProcAddressARB as usize,
        b"eglGetProcAddress" => eglGetProcAddress as usize,
        b"dlsym" => dlsym as usize,
        _ => return None,
    };
    Some(wrapper as *mut c_void)
}

unsafe fn intercepted_cstr(name: *const c_char) -> Option<*mut c_void> {
    if name.is_null() {
        return None;
    }
    intercepted(CStr::from_ptr(name).to_bytes())
}

/// Unwrap an entry-point group; an unresolved API is fatal when called
fn required<T>(group: FrameResult<T>) -> T {
    match group {
        Ok(group) => group,
        Err(e) => die!("{}", e),
    }
}

// ── Presentation ──

#[no_mangle]
pub unsafe extern "C" fn glXSwapBuffers(dpy: *mut XDisplay, drawable: GLXDrawable) {
    let shim = state::shim();
    let real = required(shim.entry_points().glx()).swap_buffers;
    shim.on_present(Api::Glx);
    real(dpy, drawable)
}

#[no_mangle]
pub unsafe extern "C" fn eglSwapBuffers(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
    let shim = state::shim();
    let real = required(shim.entry_points().egl()).swap_buffers;
    shim.on_present(Api::Egl);
    real(dpy, surface)
}

// ── Extension-address queries ──

#[no_mangle]
pub unsafe extern "C" fn glXGetProcAddress(name: *const GLubyte) -> *mut c_void {
    if let Some(wrapper) = intercepted_cstr(name.cast()) {
        return wrapper;
    }
    (required(state::shim().entry_points().glx()).get_proc_address)(name)
}

#[no_mangle]
pub unsafe extern "C" fn glXGetProcAddressARB(name: *const GLubyte) -> *mut c_void {
    if let Some(wrapper) = intercepted_cstr(name.cast()) {
        return wrapper;
    }
    (required(state::shim().entry_points().glx()).get_proc_address_arb)(name)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetProcAddress(name: *const c_char) -> *mut c_void {
    if let Some(wrapper) = intercepted_cstr(name) {
        return wrapper;
    }
    (required(state::shim().entry_points().egl()).get_proc_address)(name)
}

// ── Runtime lookup ──

/// Also reached by the C runtime and the dynamic loader before attach,
/// so it forwards through the bootstrapped pointer instead of the shim
#[no_mangle]
pub unsafe extern "C" fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void {
    if let Some(wrapper) = intercepted_cstr(symbol) {
        return wrapper;
    }
    match resolver::real_dlsym() {
        Ok(real) => real(handle, symbol),
        Err(e) => die!("{}", e),
    }
}
