// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Runtime loading of the Vulkan shared library.
//!
//! The backend resolves every entry point dynamically through
//! `vkGetInstanceProcAddr`, obtained from the system Vulkan library (or from a
//! library named explicitly in the device descriptor). The loaded library must
//! stay alive for as long as any function pointer resolved through it may be
//! called, so the device keeps the [`RuntimeLibrary`] around until it is
//! dropped.

use libloading::{Error as LibloadingError, Library};
use std::{
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
    path::Path,
};

/// A loaded library containing a valid Vulkan implementation.
pub struct RuntimeLibrary {
    _library: Library,
    fns: ash::StaticFn,
}

impl RuntimeLibrary {
    /// Loads the default Vulkan library for this system.
    pub fn new() -> Result<Self, LoadingError> {
        #[cfg(windows)]
        const PATHS: [&str; 1] = ["vulkan-1.dll"];
        #[cfg(all(unix, not(target_os = "android"), not(target_os = "macos")))]
        const PATHS: [&str; 1] = ["libvulkan.so.1"];
        #[cfg(target_os = "macos")]
        const PATHS: [&str; 3] = ["libvulkan.dylib", "libvulkan.1.dylib", "libMoltenVK.dylib"];
        #[cfg(target_os = "android")]
        const PATHS: [&str; 2] = ["libvulkan.so.1", "libvulkan.so"];

        let mut err: Option<LoadingError> = None;

        for path in PATHS {
            match unsafe { Self::with_path(path) } {
                Ok(library) => return Ok(library),
                Err(e) => err = Some(e),
            }
        }

        Err(err.unwrap())
    }

    /// Tries to load the dynamic library at the given path, and tries to load
    /// `vkGetInstanceProcAddr` from it.
    ///
    /// # Safety
    ///
    /// - The dynamic library must be a valid Vulkan implementation.
    pub unsafe fn with_path(path: impl AsRef<Path>) -> Result<Self, LoadingError> {
        let library =
            unsafe { Library::new(path.as_ref()) }.map_err(LoadingError::LibraryLoadFailure)?;

        let get_instance_proc_addr = *unsafe { library.get(b"vkGetInstanceProcAddr") }
            .map_err(LoadingError::LibraryLoadFailure)?;

        Ok(RuntimeLibrary {
            _library: library,
            fns: ash::StaticFn {
                get_instance_proc_addr,
            },
        })
    }

    /// Returns the raw global Vulkan functions of the library.
    #[inline]
    pub fn fns(&self) -> &ash::StaticFn {
        &self.fns
    }
}

/// Error that can happen when loading the Vulkan library.
#[derive(Debug)]
pub enum LoadingError {
    /// Failed to load the Vulkan shared library, or a required symbol from it.
    LibraryLoadFailure(LibloadingError),
}

impl Error for LoadingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LibraryLoadFailure(err) => Some(err),
        }
    }
}

impl Display for LoadingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::LibraryLoadFailure(_) => write!(f, "failed to load the Vulkan shared library"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadingError, RuntimeLibrary};

    #[test]
    fn dl_open_error() {
        match unsafe { RuntimeLibrary::with_path("_non_existing_library.void") } {
            Err(LoadingError::LibraryLoadFailure(_)) => (),
            _ => panic!(),
        }
    }
}
