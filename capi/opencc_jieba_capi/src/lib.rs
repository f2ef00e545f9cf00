use libc::{c_char, c_int, size_t};
use opencc_jieba_engine::{join_strings, OpenccHandle};
use std::ffi::{CStr, CString};
use std::ptr;
use tracing::warn;

/// Borrows a C string as UTF-8. Null or invalid input yields `None`.
unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Option<&'a str> {
    if ptr.is_null() {
        warn!("{what}: null pointer");
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("{what}: invalid UTF-8: {e}");
            None
        }
    }
}

unsafe fn handle<'a>(instance: *const OpenccHandle) -> Option<&'a OpenccHandle> {
    if instance.is_null() {
        warn!("null engine handle");
        return None;
    }
    Some(&*instance)
}

// Interior NULs cannot cross the boundary.
fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(e) => {
            warn!("output contains NUL at byte {}", e.nul_position());
            ptr::null_mut()
        }
    }
}

/// NULL-terminated array of owned C strings.
fn into_c_string_array(items: Vec<String>) -> *mut *mut c_char {
    let mut array: Vec<*mut c_char> = Vec::with_capacity(items.len() + 1);
    for item in items {
        let c = into_c_string(item);
        if c.is_null() {
            for p in array {
                unsafe { drop(CString::from_raw(p)) };
            }
            return ptr::null_mut();
        }
        array.push(c);
    }
    array.push(ptr::null_mut());
    Box::into_raw(array.into_boxed_slice()) as *mut *mut c_char
}

/// Creates an engine over the embedded data. Returns null on failure.
///
/// Free with [`opencc_jieba_delete`].
#[no_mangle]
pub extern "C" fn opencc_jieba_new() -> *mut OpenccHandle {
    match OpenccHandle::create() {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(e) => {
            warn!("engine construction failed: {e}");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn opencc_jieba_delete(instance: *mut OpenccHandle) {
    if !instance.is_null() {
        // Convert the raw pointer back into a Box and let it drop
        let mut handle = unsafe { Box::from_raw(instance) };
        handle.destroy();
    }
}

/// Deprecated alias of [`opencc_jieba_delete`].
#[no_mangle]
pub extern "C" fn opencc_jieba_free(instance: *mut OpenccHandle) {
    opencc_jieba_delete(instance);
}

/// Converts `input` with the named configuration.
///
/// Returns null for a null handle, invalid UTF-8 or an unknown config.
/// Free the result with [`opencc_jieba_free_string`].
#[no_mangle]
pub extern "C" fn opencc_jieba_convert(
    instance: *const OpenccHandle,
    input: *const c_char,
    config: *const c_char,
    punctuation: bool,
) -> *mut c_char {
    let Some(handle) = (unsafe { handle(instance) }) else {
        return ptr::null_mut();
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return ptr::null_mut();
    };
    let Some(config) = (unsafe { c_str(config, "config") }) else {
        return ptr::null_mut();
    };
    match handle.convert(input, config, punctuation) {
        Ok(result) => into_c_string(result),
        Err(e) => {
            warn!("convert failed: {e}");
            ptr::null_mut()
        }
    }
}

/// `1` Traditional, `2` Simplified, `0` mixed or undetermined, `-1` on a
/// null handle or unreadable input.
#[no_mangle]
pub extern "C" fn opencc_jieba_zho_check(
    instance: *const OpenccHandle,
    input: *const c_char,
) -> c_int {
    let Some(handle) = (unsafe { handle(instance) }) else {
        return -1;
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return -1;
    };
    handle.check_script(input).unwrap_or(-1)
}

#[no_mangle]
pub extern "C" fn opencc_jieba_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        };
    }
}

/// Segments `input`. Returns a NULL-terminated array freed with
/// [`opencc_jieba_free_string_array`], or null on error.
#[no_mangle]
pub extern "C" fn opencc_jieba_cut(
    instance: *const OpenccHandle,
    input: *const c_char,
    hmm: bool,
) -> *mut *mut c_char {
    let Some(handle) = (unsafe { handle(instance) }) else {
        return ptr::null_mut();
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return ptr::null_mut();
    };
    match handle.segment(input, hmm) {
        Ok(tokens) => into_c_string_array(tokens),
        Err(e) => {
            warn!("segment failed: {e}");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn opencc_jieba_free_string_array(array: *mut *mut c_char) {
    if array.is_null() {
        return;
    }
    unsafe {
        let mut len = 0;
        while !(*array.add(len)).is_null() {
            drop(CString::from_raw(*array.add(len)));
            len += 1;
        }
        // the slice includes the NULL terminator
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(array, len + 1)));
    }
}

/// Joins a NULL-terminated string array with `delimiter`.
#[no_mangle]
pub extern "C" fn opencc_jieba_join_str(
    strings: *mut *mut c_char,
    delimiter: *const c_char,
) -> *mut c_char {
    let Some(delimiter) = (unsafe { c_str(delimiter, "delimiter") }) else {
        return ptr::null_mut();
    };
    if strings.is_null() {
        return ptr::null_mut();
    }
    let mut parts: Vec<&str> = Vec::new();
    let mut i = 0;
    loop {
        let item = unsafe { *strings.add(i) };
        if item.is_null() {
            break;
        }
        let Some(part) = (unsafe { c_str(item, "string array item") }) else {
            return ptr::null_mut();
        };
        parts.push(part);
        i += 1;
    }
    into_c_string(join_strings(&parts, delimiter))
}

#[no_mangle]
pub extern "C" fn opencc_jieba_cut_and_join(
    instance: *const OpenccHandle,
    input: *const c_char,
    hmm: bool,
    delimiter: *const c_char,
) -> *mut c_char {
    let Some(handle) = (unsafe { handle(instance) }) else {
        return ptr::null_mut();
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return ptr::null_mut();
    };
    let Some(delimiter) = (unsafe { c_str(delimiter, "delimiter") }) else {
        return ptr::null_mut();
    };
    match handle.segment_and_join(input, hmm, delimiter) {
        Ok(joined) => into_c_string(joined),
        Err(e) => {
            warn!("segment failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Top `top_k` keywords as a NULL-terminated array, or null on error
/// (including an unknown `method`).
#[no_mangle]
pub extern "C" fn opencc_jieba_keywords(
    instance: *const OpenccHandle,
    input: *const c_char,
    top_k: c_int,
    method: *const c_char,
) -> *mut *mut c_char {
    let Some(handle) = (unsafe { handle(instance) }) else {
        return ptr::null_mut();
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return ptr::null_mut();
    };
    let Some(method) = (unsafe { c_str(method, "method") }) else {
        return ptr::null_mut();
    };
    let top_k = usize::try_from(top_k).unwrap_or(0);
    match handle.extract_keywords(input, top_k, method) {
        Ok(keywords) => into_c_string_array(keywords),
        Err(e) => {
            warn!("keyword extraction failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Writes keywords and weights through the out pointers.
///
/// Returns `0` on success, `-1` for null or unreadable arguments, `-2` when
/// extraction fails. Free the outputs with
/// [`opencc_jieba_free_keywords_and_weights`].
#[no_mangle]
pub extern "C" fn opencc_jieba_keywords_and_weights(
    instance: *const OpenccHandle,
    input: *const c_char,
    top_k: size_t,
    method: *const c_char,
    out_len: *mut size_t,
    out_keywords: *mut *mut *mut c_char,
    out_weights: *mut *mut f64,
) -> i32 {
    if out_len.is_null() || out_keywords.is_null() || out_weights.is_null() {
        warn!("keywords_and_weights: null out pointer");
        return -1;
    }
    let Some(handle) = (unsafe { handle(instance) }) else {
        return -1;
    };
    let Some(input) = (unsafe { c_str(input, "input") }) else {
        return -1;
    };
    let Some(method) = (unsafe { c_str(method, "method") }) else {
        return -1;
    };
    let keywords = match handle.extract_keywords_weighted(input, top_k, method) {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!("keyword extraction failed: {e}");
            return -2;
        }
    };

    let mut words: Vec<*mut c_char> = Vec::with_capacity(keywords.len());
    let mut weights: Vec<f64> = Vec::with_capacity(keywords.len());
    for k in keywords {
        let c = into_c_string(k.keyword);
        if c.is_null() {
            for p in words {
                unsafe { drop(CString::from_raw(p)) };
            }
            return -2;
        }
        words.push(c);
        weights.push(k.weight);
    }

    unsafe {
        *out_len = words.len();
        *out_keywords = Box::into_raw(words.into_boxed_slice()) as *mut *mut c_char;
        *out_weights = Box::into_raw(weights.into_boxed_slice()) as *mut f64;
    }
    0
}

#[no_mangle]
pub extern "C" fn opencc_jieba_free_keywords_and_weights(
    keywords: *mut *mut c_char,
    weights: *mut f64,
    len: size_t,
) {
    unsafe {
        if !keywords.is_null() {
            for i in 0..len {
                let p = *keywords.add(i);
                if !p.is_null() {
                    drop(CString::from_raw(p));
                }
            }
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(keywords, len)));
        }
        if !weights.is_null() {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(weights, len)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> CString {
        CString::new(s).expect("CString conversion failed")
    }

    fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        opencc_jieba_free_string(ptr);
        s
    }

    fn take_array(array: *mut *mut c_char) -> Vec<String> {
        assert!(!array.is_null());
        let mut out = Vec::new();
        let mut i = 0;
        unsafe {
            while !(*array.add(i)).is_null() {
                out.push(CStr::from_ptr(*array.add(i)).to_string_lossy().into_owned());
                i += 1;
            }
        }
        opencc_jieba_free_string_array(array);
        out
    }

    #[test]
    fn test_opencc_jieba_zho_check() {
        let opencc = opencc_jieba_new();
        let input = c("你好，世界，欢迎");
        assert_eq!(opencc_jieba_zho_check(opencc, input.as_ptr()), 2);
        assert_eq!(opencc_jieba_zho_check(ptr::null(), input.as_ptr()), -1);
        opencc_jieba_delete(opencc);
    }

    #[test]
    fn test_opencc_jieba_convert() {
        let opencc = opencc_jieba_new();
        let input = c("意大利罗浮宫里收藏的“蒙娜丽莎的微笑”画像是旷世之作。");
        let config = c("s2twp");
        let result = opencc_jieba_convert(opencc, input.as_ptr(), config.as_ptr(), true);
        assert_eq!(
            take_string(result),
            "義大利羅浮宮裡收藏的「蒙娜麗莎的微笑」畫像是曠世之作。"
        );

        let bad = c("S2TWP");
        assert!(opencc_jieba_convert(opencc, input.as_ptr(), bad.as_ptr(), true).is_null());
        opencc_jieba_delete(opencc);
    }

    #[test]
    fn test_opencc_jieba_convert_t2s() {
        let opencc = opencc_jieba_new();
        let input = c("豫章故郡，洪都新府。星分翼軫，地接衡廬。襟三江而帶五湖，控蠻荊而引甌越。");
        let config = c("t2s");
        let result = opencc_jieba_convert(opencc, input.as_ptr(), config.as_ptr(), true);
        assert_eq!(
            take_string(result),
            "豫章故郡，洪都新府。星分翼轸，地接衡庐。襟三江而带五湖，控蛮荆而引瓯越。"
        );
        opencc_jieba_free(opencc);
    }

    #[test]
    fn test_opencc_jieba_cut_and_join() {
        let opencc = opencc_jieba_new();
        let input = c("南京市长江大桥");
        let tokens = take_array(opencc_jieba_cut(opencc, input.as_ptr(), true));
        assert_eq!(tokens, vec!["南京市", "长江大桥"]);

        let delimiter = c("/");
        let joined = opencc_jieba_cut_and_join(opencc, input.as_ptr(), true, delimiter.as_ptr());
        assert_eq!(take_string(joined), "南京市/长江大桥");

        let array = opencc_jieba_cut(opencc, input.as_ptr(), false);
        let joined = opencc_jieba_join_str(array, delimiter.as_ptr());
        opencc_jieba_free_string_array(array);
        assert_eq!(take_string(joined), "南京市/长江大桥");

        assert!(opencc_jieba_cut(ptr::null(), input.as_ptr(), true).is_null());
        opencc_jieba_delete(opencc);
    }

    #[test]
    fn test_opencc_jieba_keywords() {
        let opencc = opencc_jieba_new();
        let input = c("自然语言处理是人工智能的一个重要方向。自然语言处理很重要。");
        let method = c("tfidf");
        let keywords = take_array(opencc_jieba_keywords(opencc, input.as_ptr(), 2, method.as_ptr()));
        assert_eq!(keywords, vec!["自然语言", "处理"]);

        let unknown = c("bm25");
        assert!(opencc_jieba_keywords(opencc, input.as_ptr(), 2, unknown.as_ptr()).is_null());

        let mut len: size_t = 0;
        let mut words: *mut *mut c_char = ptr::null_mut();
        let mut weights: *mut f64 = ptr::null_mut();
        let textrank = c("textrank");
        let code = opencc_jieba_keywords_and_weights(
            opencc,
            input.as_ptr(),
            3,
            textrank.as_ptr(),
            &mut len,
            &mut words,
            &mut weights,
        );
        assert_eq!(code, 0);
        assert!(len > 0 && len <= 3);
        let top = unsafe { *weights };
        assert!((top - 1.0).abs() < 1e-9);
        opencc_jieba_free_keywords_and_weights(words, weights, len);

        let code = opencc_jieba_keywords_and_weights(
            opencc,
            input.as_ptr(),
            3,
            unknown.as_ptr(),
            &mut len,
            &mut words,
            &mut weights,
        );
        assert_eq!(code, -2);
        opencc_jieba_delete(opencc);
    }
}
