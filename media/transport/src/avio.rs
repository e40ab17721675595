/*!
    FFmpeg custom-I/O adapter over a transport handle.

    This is the ABI boundary: the handle crosses into FFmpeg as an opaque
    pointer, and FFmpeg calls back through a fixed pair of read/seek
    functions. Nothing outside this module touches raw pointers.
*/

use std::ffi::c_void;
use std::os::raw::c_int;

use ffmpeg_next::ffi;

use media_types::{Error, Result};

use crate::handle::{TransportHandle, Whence};

/// Size of the buffer handed to the AVIO layer.
const IO_BUFFER_SIZE: usize = 32 * 1024;

/**
    An `AVIOContext` wired to a [`TransportHandle`].

    The handle is boxed and installed as the context's opaque pointer; the
    read/seek callbacks recover it on every call. For streamed handles no
    seek callback is installed at all, so the demuxer never attempts random
    access.

    Dropping the adapter closes the handle and releases the AVIO context and
    its buffer exactly once. Drop it only after the format context using it
    is gone.
*/
pub struct TransportIo {
    ctx: *mut ffi::AVIOContext,
}

impl TransportIo {
    /**
        Wrap a transport handle in an AVIO context.
    */
    pub fn new(handle: TransportHandle) -> Result<Self> {
        let streamed = handle.is_streamed();
        let opaque = Box::into_raw(Box::new(handle)) as *mut c_void;

        unsafe {
            let buffer = ffi::av_malloc(IO_BUFFER_SIZE) as *mut u8;
            if buffer.is_null() {
                drop(Box::from_raw(opaque as *mut TransportHandle));
                return Err(Error::OutOfMemory);
            }

            let seek: Option<unsafe extern "C" fn(*mut c_void, i64, c_int) -> i64> =
                if streamed { None } else { Some(seek_cb) };

            let ctx = ffi::avio_alloc_context(
                buffer,
                IO_BUFFER_SIZE as c_int,
                0,
                opaque,
                Some(read_cb),
                None,
                seek,
            );
            if ctx.is_null() {
                ffi::av_free(buffer as *mut c_void);
                drop(Box::from_raw(opaque as *mut TransportHandle));
                return Err(Error::OutOfMemory);
            }

            if streamed {
                (*ctx).seekable = 0;
            }

            Ok(Self { ctx })
        }
    }

    /**
        The raw context pointer, for installing into a format context.
    */
    pub fn as_mut_ptr(&mut self) -> *mut ffi::AVIOContext {
        self.ctx
    }
}

impl Drop for TransportIo {
    fn drop(&mut self) {
        unsafe {
            let opaque = (*self.ctx).opaque;
            if !opaque.is_null() {
                let mut handle = Box::from_raw(opaque as *mut TransportHandle);
                handle.close();
                (*self.ctx).opaque = std::ptr::null_mut();
            }
            // The AVIO layer may have replaced the buffer it was given.
            ffi::av_freep(&mut (*self.ctx).buffer as *mut _ as *mut c_void);
            ffi::avio_context_free(&mut self.ctx);
        }
    }
}

unsafe extern "C" fn read_cb(opaque: *mut c_void, buf: *mut u8, len: c_int) -> c_int {
    if opaque.is_null() || buf.is_null() || len <= 0 {
        return ffi::AVERROR(libc::EIO);
    }

    let handle = unsafe { &mut *(opaque as *mut TransportHandle) };
    let slice = unsafe { std::slice::from_raw_parts_mut(buf, len as usize) };

    match handle.read(slice) {
        Ok(0) => ffi::AVERROR_EOF,
        Ok(n) => n as c_int,
        Err(_) => ffi::AVERROR(libc::EIO),
    }
}

unsafe extern "C" fn seek_cb(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    if opaque.is_null() {
        return ffi::AVERROR(libc::EIO) as i64;
    }

    let handle = unsafe { &mut *(opaque as *mut TransportHandle) };
    let whence = whence & !(ffi::AVSEEK_FORCE as c_int);

    let mapped = if whence == ffi::AVSEEK_SIZE as c_int {
        Whence::Size
    } else {
        match whence {
            0 => Whence::Set,
            1 => Whence::Current,
            2 => Whence::End,
            _ => return ffi::AVERROR(libc::EINVAL) as i64,
        }
    };

    match handle.seek(offset, mapped) {
        Ok(pos) => pos,
        Err(Error::Unsupported(_)) => ffi::AVERROR(libc::ENOSYS) as i64,
        Err(_) => ffi::AVERROR(libc::EIO) as i64,
    }
}
