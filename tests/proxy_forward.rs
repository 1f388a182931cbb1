// Integration tests for the forwarding loop, driven with in-memory mock
// streams: bytes must cross verbatim regardless of frame boundaries.

use std::sync::Arc;

use gdbproxy::proxy::session::forward;
use gdbproxy::proxy::Console;
use tokio_test::assert_ok;

fn quiet_console() -> Arc<Console> {
    Arc::new(Console::new(1, false, false, None))
}

#[test]
fn test_forward_passes_bytes_verbatim() {
    tokio_test::block_on(async {
        let rx = tokio_test::io::Builder::new().read(b"+$g#67").build();
        let tx = tokio_test::io::Builder::new().write(b"+$g#67").build();

        let result = forward(rx, tx, quiet_console(), true).await;
        assert_ok!(result);
    });
}

#[test]
fn test_forward_preserves_chunk_boundaries() {
    // Each read is forwarded before the next one; a frame split across
    // reads crosses the wire in the same pieces.
    tokio_test::block_on(async {
        let rx = tokio_test::io::Builder::new()
            .read(b"$m10")
            .read(b"00,4#8e")
            .build();
        let tx = tokio_test::io::Builder::new()
            .write(b"$m10")
            .write(b"00,4#8e")
            .build();

        let result = forward(rx, tx, quiet_console(), true).await;
        assert_ok!(result);
    });
}

#[test]
fn test_forward_passes_invalid_frames_through() {
    // A bad checksum is the endpoints' problem; the proxy still forwards.
    tokio_test::block_on(async {
        let rx = tokio_test::io::Builder::new().read(b"$g#00-").build();
        let tx = tokio_test::io::Builder::new().write(b"$g#00-").build();

        let result = forward(rx, tx, quiet_console(), false).await;
        assert_ok!(result);
    });
}

#[test]
fn test_forward_ends_cleanly_on_eof() {
    tokio_test::block_on(async {
        let rx = tokio_test::io::Builder::new().build();
        let tx = tokio_test::io::Builder::new().build();

        let result = forward(rx, tx, quiet_console(), true).await;
        assert_ok!(result);
    });
}
