//! Dynamic library loading for add-in components
//!
//! Opens the shared library (.so, .dylib, .dll) that exports the component
//! entry points and keeps it mapped until the last user drops it.

#[cfg(unix)]
use std::ffi::CStr;
use std::ffi::{c_void, CString};
use std::path::Path;

use crate::error::{AbiError, AbiResult};

/// Cross-platform dynamic library handle
pub struct Library {
    handle: LibraryHandle,
    path: String,
}

impl Library {
    /// Load a component library from the given path.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Linux / macOS**: `dlopen(RTLD_NOW | RTLD_LOCAL)`
    /// - **Windows**: `LoadLibraryW`
    pub fn open<P: AsRef<Path>>(path: P) -> AbiResult<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .to_str()
            .ok_or_else(|| AbiError::InvalidPath(format!("{:?}", path_ref)))?;

        let handle = LibraryHandle::load(path_str)?;
        tracing::debug!(path = path_str, "loaded component library");

        Ok(Library {
            handle,
            path: path_str.to_string(),
        })
    }

    /// Resolve an exported symbol.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type matching the exported signature,
    /// and the library must stay loaded while the pointer is used.
    pub unsafe fn get<T: Copy>(&self, symbol: &str) -> AbiResult<T> {
        self.handle.symbol(symbol, &self.path)
    }

    /// Platform module handle, passed to the native side as `libraryHandle`
    pub fn raw_handle(&self) -> *mut c_void {
        self.handle.handle
    }

    /// Get the path this library was loaded from
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("path", &self.path).finish()
    }
}

#[cfg(unix)]
type LibraryHandle = UnixLibrary;

#[cfg(windows)]
type LibraryHandle = WindowsLibrary;

// ============================================================================
// Unix Implementation (Linux, macOS, BSD)
// ============================================================================

#[cfg(unix)]
struct UnixLibrary {
    handle: *mut c_void,
}

#[cfg(unix)]
impl UnixLibrary {
    fn load(path: &str) -> AbiResult<Self> {
        let c_path =
            CString::new(path).map_err(|e| AbiError::Platform(format!("Invalid path: {}", e)))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };

        if handle.is_null() {
            return Err(AbiError::LibraryNotFound {
                path: format!("{}: {}", path, last_dl_error().unwrap_or_else(|| "Unknown error".into())),
            });
        }

        Ok(UnixLibrary { handle })
    }

    unsafe fn symbol<T: Copy>(&self, name: &str, lib_path: &str) -> AbiResult<T> {
        let c_name = CString::new(name)
            .map_err(|e| AbiError::Platform(format!("Invalid symbol name: {}", e)))?;

        // Clear any stale error so the check below only sees ours
        libc::dlerror();
        let symbol = libc::dlsym(self.handle, c_name.as_ptr());

        if let Some(error) = last_dl_error() {
            return Err(AbiError::SymbolNotFound {
                symbol: name.to_string(),
                library: format!("{}: {}", lib_path, error),
            });
        }
        if symbol.is_null() {
            return Err(AbiError::SymbolNotFound {
                symbol: name.to_string(),
                library: lib_path.to_string(),
            });
        }

        Ok(std::mem::transmute_copy(&symbol))
    }
}

#[cfg(unix)]
fn last_dl_error() -> Option<String> {
    unsafe {
        let err_ptr = libc::dlerror();
        if err_ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(err_ptr).to_string_lossy().into_owned())
        }
    }
}

#[cfg(unix)]
impl Drop for UnixLibrary {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

#[cfg(unix)]
unsafe impl Send for UnixLibrary {}
#[cfg(unix)]
unsafe impl Sync for UnixLibrary {}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
struct WindowsLibrary {
    handle: *mut c_void,
}

#[cfg(windows)]
impl WindowsLibrary {
    fn load(path: &str) -> AbiResult<Self> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        let wide: Vec<u16> = OsStr::new(path)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };

        if handle.is_null() {
            let error = unsafe { GetLastError() };
            return Err(AbiError::LibraryNotFound {
                path: format!("{} (error code: {})", path, error),
            });
        }

        Ok(WindowsLibrary { handle })
    }

    unsafe fn symbol<T: Copy>(&self, name: &str, lib_path: &str) -> AbiResult<T> {
        let c_name = CString::new(name)
            .map_err(|e| AbiError::Platform(format!("Invalid symbol name: {}", e)))?;

        let symbol = GetProcAddress(self.handle, c_name.as_ptr());

        if symbol.is_null() {
            let error = GetLastError();
            return Err(AbiError::SymbolNotFound {
                symbol: name.to_string(),
                library: format!("{} (error code: {})", lib_path, error),
            });
        }

        Ok(std::mem::transmute_copy(&symbol))
    }
}

#[cfg(windows)]
impl Drop for WindowsLibrary {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.handle);
        }
    }
}

#[cfg(windows)]
unsafe impl Send for WindowsLibrary {}
#[cfg(windows)]
unsafe impl Sync for WindowsLibrary {}

#[cfg(windows)]
extern "system" {
    fn LoadLibraryW(filename: *const u16) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, procname: *const std::ffi::c_char) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> i32;
    fn GetLastError() -> u32;
}
