//! WebGL renderer probe

use super::sentinel::{NO_WEBGL, UNKNOWN_GPU, WEBGL_ERROR};
use crate::domain::host::{BrowserHost, GpuInfo};

/// `vendor|renderer` of the unmasked GPU
pub fn gpu_signature<H: BrowserHost + ?Sized>(host: &H) -> String {
    match host.create_webgl() {
        Ok(Some(gl)) => match gl.debug_renderer_info() {
            Ok(Some(GpuInfo { vendor, renderer })) => format!("{vendor}|{renderer}"),
            Ok(None) => UNKNOWN_GPU.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "WebGL debug info failed");
                WEBGL_ERROR.to_string()
            }
        },
        Ok(None) => NO_WEBGL.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "WebGL unavailable");
            WEBGL_ERROR.to_string()
        }
    }
}

/// Unmasked renderer name, when the host exposes it
pub fn renderer<H: BrowserHost + ?Sized>(host: &H) -> Option<String> {
    let gl = host.create_webgl().ok()??;
    gl.debug_renderer_info().ok()?.map(|info| info.renderer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::snapshot::{HostSnapshot, SnapshotHost, WebGlSnapshot};

    fn host(webgl: Option<WebGlSnapshot>) -> SnapshotHost {
        SnapshotHost::new(HostSnapshot {
            webgl,
            ..Default::default()
        })
    }

    #[test]
    fn test_gpu_signature() {
        let host = host(Some(WebGlSnapshot {
            debug_info: Some(GpuInfo {
                vendor: "Intel Inc.".into(),
                renderer: "Intel Iris".into(),
            }),
        }));
        assert_eq!(gpu_signature(&host), "Intel Inc.|Intel Iris");
        assert_eq!(renderer(&host).as_deref(), Some("Intel Iris"));
    }

    #[test]
    fn test_missing_extension_is_unknown() {
        let host = host(Some(WebGlSnapshot { debug_info: None }));
        assert_eq!(gpu_signature(&host), UNKNOWN_GPU);
        assert_eq!(renderer(&host), None);
    }

    #[test]
    fn test_no_webgl() {
        assert_eq!(gpu_signature(&host(None)), NO_WEBGL);
    }
}
