//! Raw GL / GLX / EGL types used by the shim.
//!
//! Mirrors the handful of declarations from `GL/gl.h`, `GL/glx.h` and
//! `EGL/egl.h` the wrappers and the timer-query backend need. Nothing here
//! is linked; every function is reached through a resolved address.

use libc::{c_char, c_int, c_uchar, c_uint, c_ulong, c_void};

// ── Scalar types ──

pub type GLenum = c_uint;
pub type GLuint = c_uint;
pub type GLint = c_int;
pub type GLsizei = c_int;
pub type GLubyte = c_uchar;
pub type GLuint64 = u64;

/// Opaque Xlib `Display`
pub type XDisplay = c_void;
pub type GLXDrawable = c_ulong;

pub type EGLDisplay = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLBoolean = c_uint;

// ── Enums ──

pub const GL_EXTENSIONS: GLenum = 0x1F03;
pub const GL_NUM_EXTENSIONS: GLenum = 0x821D;
pub const GL_QUERY_COUNTER_BITS: GLenum = 0x8864;
pub const GL_QUERY_RESULT: GLenum = 0x8866;
pub const GL_QUERY_RESULT_AVAILABLE: GLenum = 0x8867;
pub const GL_TIMESTAMP: GLenum = 0x8E28;

// ── Intercepted entry points ──

pub type GlxSwapBuffersFn = unsafe extern "C" fn(*mut XDisplay, GLXDrawable);
pub type GlxGetProcAddressFn = unsafe extern "C" fn(*const GLubyte) -> *mut c_void;
pub type EglSwapBuffersFn = unsafe extern "C" fn(EGLDisplay, EGLSurface) -> EGLBoolean;
pub type EglGetProcAddressFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
pub type DlsymFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;

// ── Timer-query entry points ──

pub type GetStringFn = unsafe extern "C" fn(GLenum) -> *const GLubyte;
pub type GetStringiFn = unsafe extern "C" fn(GLenum, GLuint) -> *const GLubyte;
pub type GetIntegervFn = unsafe extern "C" fn(GLenum, *mut GLint);
pub type GenQueriesFn = unsafe extern "C" fn(GLsizei, *mut GLuint);
pub type QueryCounterFn = unsafe extern "C" fn(GLuint, GLenum);
pub type GetQueryivFn = unsafe extern "C" fn(GLenum, GLenum, *mut GLint);
pub type GetQueryObjectuivFn = unsafe extern "C" fn(GLuint, GLenum, *mut GLuint);
pub type GetQueryObjectui64vFn = unsafe extern "C" fn(GLuint, GLenum, *mut GLuint64);
