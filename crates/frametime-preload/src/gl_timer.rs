//! GL timestamp queries
//!
//! Two flavors of the same API are supported:
//!
//! | Extension                     | Entry points            |
//! |-------------------------------|-------------------------|
//! | `GL_ARB_timer_query`          | `glQueryCounter`, ...    |
//! | `GL_EXT_disjoint_timer_query` | `glQueryCounterEXT`, ... |
//!
//! Desktop contexts usually expose the ARB form, GLES contexts the EXT one.
//! Loading runs on the first presented frame, with the host's context
//! current on the calling thread.

use std::ffi::{CStr, CString};

use frametime_core::error::{FrameError, FrameResult};
use frametime_core::{kdebug, TimerQueries};
use libc::c_void;

use crate::gl::*;

/// Which timer-query extension the context offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Arb,
    DisjointExt,
}

impl Flavor {
    pub fn extension(&self) -> &'static str {
        match self {
            Flavor::Arb => "GL_ARB_timer_query",
            Flavor::DisjointExt => "GL_EXT_disjoint_timer_query",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Flavor::Arb => "",
            Flavor::DisjointExt => "EXT",
        }
    }
}

/// Timer-query backend bound to one GL context
#[derive(Debug)]
pub struct GlTimerQueries {
    flavor: Flavor,
    bits: u32,
    gen_queries: GenQueriesFn,
    query_counter: QueryCounterFn,
    get_query_object_uiv: GetQueryObjectuivFn,
    get_query_object_ui64v: GetQueryObjectui64vFn,
}

impl GlTimerQueries {
    /// Check the context's extensions and load the timer-query functions.
    ///
    /// `loader` maps a GL function name to its address, or null.
    ///
    /// # Safety
    /// A GL context must be current on the calling thread, and every
    /// non-null address `loader` returns must be the named GL function.
    pub unsafe fn load<L>(loader: L) -> FrameResult<Self>
    where
        L: Fn(&CStr) -> *mut c_void,
    {
        let extensions = read_extensions(&loader)?;
        let flavor = [Flavor::Arb, Flavor::DisjointExt]
            .into_iter()
            .find(|f| has_extension(&extensions, f.extension()))
            .ok_or(FrameError::MissingExtension(
                "GL_ARB_timer_query or GL_EXT_disjoint_timer_query",
            ))?;
        kdebug!("timer queries via {}", flavor.extension());

        let get_query_iv: GetQueryivFn = load_fn(&loader, "glGetQueryiv", flavor.suffix())?;
        let mut bits: GLint = 0;
        get_query_iv(GL_TIMESTAMP, GL_QUERY_COUNTER_BITS, &mut bits);

        Ok(Self {
            flavor,
            bits: bits.max(0) as u32,
            gen_queries: load_fn(&loader, "glGenQueries", flavor.suffix())?,
            query_counter: load_fn(&loader, "glQueryCounter", flavor.suffix())?,
            get_query_object_uiv: load_fn(&loader, "glGetQueryObjectuiv", flavor.suffix())?,
            get_query_object_ui64v: load_fn(&loader, "glGetQueryObjectui64v", flavor.suffix())?,
        })
    }
}

// Safety for every method below: the backend is only driven from the
// presentation wrappers, where the context it was loaded from is current.
impl TimerQueries for GlTimerQueries {
    fn create(&mut self, count: usize) -> Vec<u32> {
        let mut ids = vec![0 as GLuint; count];
        unsafe { (self.gen_queries)(count as GLsizei, ids.as_mut_ptr()) };
        ids
    }

    fn record_timestamp(&mut self, query: u32) {
        unsafe { (self.query_counter)(query, GL_TIMESTAMP) };
    }

    fn is_available(&mut self, query: u32) -> bool {
        let mut ready: GLuint = 0;
        unsafe { (self.get_query_object_uiv)(query, GL_QUERY_RESULT_AVAILABLE, &mut ready) };
        ready != 0
    }

    fn timestamp(&mut self, query: u32) -> u64 {
        let mut value: GLuint64 = 0;
        unsafe { (self.get_query_object_ui64v)(query, GL_QUERY_RESULT, &mut value) };
        value
    }

    fn counter_bits(&self) -> u32 {
        self.bits
    }
}

/// Whole-token match in a space-separated extension list
pub fn has_extension(list: &str, name: &str) -> bool {
    list.split_ascii_whitespace().any(|ext| ext == name)
}

/// The context's extensions as one space-separated string
///
/// Core profiles drop `GL_EXTENSIONS` from `glGetString`, so the indexed
/// query is tried first when the context offers it.
unsafe fn read_extensions<L>(loader: &L) -> FrameResult<String>
where
    L: Fn(&CStr) -> *mut c_void,
{
    let get_integerv = loader(c"glGetIntegerv");
    let get_stringi = loader(c"glGetStringi");
    if !get_integerv.is_null() && !get_stringi.is_null() {
        let get_integerv: GetIntegervFn = std::mem::transmute(get_integerv);
        let get_stringi: GetStringiFn = std::mem::transmute(get_stringi);

        let mut count: GLint = 0;
        get_integerv(GL_NUM_EXTENSIONS, &mut count);
        if count > 0 {
            let names: Vec<String> = (0..count as GLuint)
                .filter_map(|i| gl_string(get_stringi(GL_EXTENSIONS, i)))
                .collect();
            return Ok(names.join(" "));
        }
    }

    let get_string: GetStringFn = load_fn(loader, "glGetString", "")?;
    Ok(gl_string(get_string(GL_EXTENSIONS)).unwrap_or_default())
}

unsafe fn load_fn<L, F>(loader: &L, base: &str, suffix: &str) -> FrameResult<F>
where
    L: Fn(&CStr) -> *mut c_void,
    F: Copy,
{
    let name = format!("{}{}", base, suffix);
    let c_name = CString::new(name.as_str()).map_err(|_| FrameError::MissingFunction(name.clone()))?;
    let p = loader(&c_name);
    if p.is_null() {
        return Err(FrameError::MissingFunction(name));
    }
    Ok(std::mem::transmute_copy(&p))
}

unsafe fn gl_string(s: *const GLubyte) -> Option<String> {
    if s.is_null() {
        return None;
    }
    Some(CStr::from_ptr(s.cast()).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::ptr;

    // Fake GL driven through thread-locals, since the entry points are
    // plain extern "C" functions
    thread_local! {
        static NUM_EXTENSIONS: Cell<GLint> = const { Cell::new(0) };
        static EXTENSIONS: RefCell<Vec<CString>> = const { RefCell::new(Vec::new()) };
        static JOINED: RefCell<CString> = RefCell::new(CString::default());
        static COUNTER_BITS: Cell<GLint> = const { Cell::new(64) };
        static COUNTERS: RefCell<Vec<(GLuint, GLenum)>> = const { RefCell::new(Vec::new()) };
        static NEXT_ID: Cell<GLuint> = const { Cell::new(1) };
    }

    fn set_extensions(indexed: bool, list: &[&str]) {
        let names: Vec<CString> = list.iter().map(|s| CString::new(*s).unwrap()).collect();
        NUM_EXTENSIONS.with(|n| n.set(if indexed { names.len() as GLint } else { 0 }));
        JOINED.with(|j| *j.borrow_mut() = CString::new(list.join(" ")).unwrap());
        EXTENSIONS.with(|e| *e.borrow_mut() = names);
    }

    unsafe extern "C" fn fake_get_string(name: GLenum) -> *const GLubyte {
        assert_eq!(name, GL_EXTENSIONS);
        JOINED.with(|j| j.borrow().as_ptr().cast())
    }

    unsafe extern "C" fn fake_get_stringi(name: GLenum, i: GLuint) -> *const GLubyte {
        assert_eq!(name, GL_EXTENSIONS);
        EXTENSIONS.with(|e| e.borrow()[i as usize].as_ptr().cast())
    }

    unsafe extern "C" fn fake_get_integerv(name: GLenum, out: *mut GLint) {
        assert_eq!(name, GL_NUM_EXTENSIONS);
        *out = NUM_EXTENSIONS.with(Cell::get);
    }

    unsafe extern "C" fn fake_get_queryiv(target: GLenum, pname: GLenum, out: *mut GLint) {
        assert_eq!((target, pname), (GL_TIMESTAMP, GL_QUERY_COUNTER_BITS));
        *out = COUNTER_BITS.with(Cell::get);
    }

    unsafe extern "C" fn fake_gen_queries(n: GLsizei, ids: *mut GLuint) {
        for i in 0..n as usize {
            *ids.add(i) = NEXT_ID.with(|c| {
                let id = c.get();
                c.set(id + 1);
                id
            });
        }
    }

    unsafe extern "C" fn fake_query_counter(id: GLuint, target: GLenum) {
        COUNTERS.with(|c| c.borrow_mut().push((id, target)));
    }

    unsafe extern "C" fn fake_get_query_object_uiv(_: GLuint, pname: GLenum, out: *mut GLuint) {
        assert_eq!(pname, GL_QUERY_RESULT_AVAILABLE);
        *out = 1;
    }

    unsafe extern "C" fn fake_get_query_object_ui64v(id: GLuint, pname: GLenum, out: *mut GLuint64) {
        assert_eq!(pname, GL_QUERY_RESULT);
        *out = id as GLuint64 * 1_000_000;
    }

    /// Loader exposing the fake GL with the given function-name suffix
    fn fake_loader(suffix: &'static str, core: bool) -> impl Fn(&CStr) -> *mut c_void {
        move |name: &CStr| {
            let name = name.to_str().unwrap();
            let p: usize = match name {
                "glGetString" => fake_get_string as usize,
                "glGetStringi" if core => fake_get_stringi as usize,
                "glGetIntegerv" if core => fake_get_integerv as usize,
                _ => match name.strip_suffix(suffix) {
                    Some("glGetQueryiv") => fake_get_queryiv as usize,
                    Some("glGenQueries") => fake_gen_queries as usize,
                    Some("glQueryCounter") => fake_query_counter as usize,
                    Some("glGetQueryObjectuiv") => fake_get_query_object_uiv as usize,
                    Some("glGetQueryObjectui64v") => fake_get_query_object_ui64v as usize,
                    _ => 0,
                },
            };
            p as *mut c_void
        }
    }

    #[test]
    fn test_has_extension_whole_token() {
        let list = "GL_ARB_timer_query_extra GL_EXT_foo GL_ARB_timer_query";
        assert!(has_extension(list, "GL_ARB_timer_query"));
        assert!(has_extension(list, "GL_EXT_foo"));
        assert!(!has_extension("GL_ARB_timer_query_extra", "GL_ARB_timer_query"));
        assert!(!has_extension("", "GL_ARB_timer_query"));
    }

    #[test]
    fn test_load_arb_from_legacy_string() {
        set_extensions(false, &["GL_ARB_multitexture", "GL_ARB_timer_query"]);
        COUNTER_BITS.with(|b| b.set(64));

        let mut q = unsafe { GlTimerQueries::load(fake_loader("", false)) }.unwrap();
        assert_eq!(q.flavor, Flavor::Arb);
        assert_eq!(q.counter_bits(), 64);

        let ids = q.create(3);
        assert_eq!(ids.len(), 3);
        q.record_timestamp(ids[1]);
        COUNTERS.with(|c| assert_eq!(c.borrow().last(), Some(&(ids[1], GL_TIMESTAMP))));
        assert!(q.is_available(ids[1]));
        assert_eq!(q.timestamp(ids[1]), ids[1] as u64 * 1_000_000);
    }

    #[test]
    fn test_load_ext_from_indexed_list() {
        set_extensions(true, &["GL_OES_depth24", "GL_EXT_disjoint_timer_query"]);
        COUNTER_BITS.with(|b| b.set(48));

        let q = unsafe { GlTimerQueries::load(fake_loader("EXT", true)) }.unwrap();
        assert_eq!(q.flavor, Flavor::DisjointExt);
        assert_eq!(q.counter_bits(), 48);
    }

    #[test]
    fn test_missing_extension_is_degradable() {
        set_extensions(false, &["GL_ARB_multitexture", "GL_ARB_timer_query_v2"]);
        let err = unsafe { GlTimerQueries::load(fake_loader("", false)) }.unwrap_err();
        assert!(matches!(err, FrameError::MissingExtension(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_missing_function_is_degradable() {
        set_extensions(false, &["GL_EXT_disjoint_timer_query"]);
        // The context claims the EXT flavor but only exports unsuffixed names
        let err = unsafe { GlTimerQueries::load(fake_loader("", false)) }.unwrap_err();
        assert_eq!(err, FrameError::MissingFunction("glGetQueryivEXT".into()));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_no_string_query_at_all() {
        let err = unsafe { GlTimerQueries::load(|_: &CStr| ptr::null_mut()) }.unwrap_err();
        assert_eq!(err, FrameError::MissingFunction("glGetString".into()));
    }
}
