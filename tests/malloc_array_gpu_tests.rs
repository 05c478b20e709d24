//! hipMallocArray conformance on real hardware
//!
//! Requires `--features rocm`; every test skips when no GPU is visible.

#[cfg(feature = "rocm")]
mod common;

#[cfg(feature = "rocm")]
mod gpu {
    use super::common::GPU_FIXTURE;
    use hipprobe::hip::{
        ArrayExtent, ArrayFlags, ArrayHandle, ArrayRuntime, ChannelFormatDesc, DeviceArray,
        HipStatus,
    };
    use hipprobe::probe::{self, Verdict};
    use hipprobe::ProbeConfig;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_malloc_array_negative() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        let report = probe::run_negative(fixture.runtime(), &ProbeConfig::default())
            .expect("negative probe aborted");

        assert!(report.passed(), "{}", report);
        // HipRuntime talks to the AMD backend, where null-pointer cases are not checked
        assert_eq!(report.skipped().len(), 2);
        fixture.assert_no_leak();
    }

    #[test]
    #[serial]
    fn test_malloc_array_zero_height_accepted() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        let runtime = fixture.runtime();
        let mut handle = ArrayHandle::null();
        let status = runtime.malloc_array(
            Some(&mut handle),
            Some(&ChannelFormatDesc::of::<f32>()),
            4,
            0,
            ArrayFlags::DEFAULT,
        );
        assert_eq!(status, HipStatus::SUCCESS);
        assert_eq!(runtime.free_array(handle), HipStatus::SUCCESS);
    }

    #[test]
    #[serial]
    fn test_malloc_array_basic() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        let report = probe::run_basic(fixture.runtime(), &ProbeConfig::default())
            .expect("hipFreeArray failed");

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes.iter().all(|o| o.verdict == Verdict::Passed), "{}", report);
    }

    #[test]
    #[serial]
    fn test_malloc_array_diff_sizes() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        let report = probe::run_size_sweep(fixture.runtime(), 0, &ProbeConfig::default())
            .expect("size sweep aborted");
        assert!(report.passed(), "{}", report);
    }

    #[test]
    #[serial]
    fn test_malloc_array_multi_thread() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        fixture.runtime().set_device(0).expect("hipSetDevice(0) failed");
        let report = probe::run_multi_device(fixture.runtime(), &ProbeConfig::default())
            .expect("multi-device probe aborted");

        assert_eq!(
            report.outcome("global snapshot").map(|o| o.verdict),
            Some(Verdict::Passed),
            "{}",
            report
        );
        assert!(report.passed(), "{}", report);
    }

    #[test]
    #[serial]
    fn test_device_array_raii_returns_memory() {
        let Some(fixture) = GPU_FIXTURE.as_ref() else {
            return;
        };
        let runtime = fixture.runtime();
        runtime.set_device(0).unwrap();
        let before = runtime.mem_get_info().unwrap();
        {
            let _arrays: Vec<_> = (0..8)
                .map(|_| {
                    DeviceArray::new(
                        runtime,
                        &ChannelFormatDesc::of::<[u8; 4]>(),
                        ArrayExtent::new(100, 100),
                        ArrayFlags::DEFAULT,
                    )
                    .expect("hipMallocArray failed")
                })
                .collect();
        }
        assert_eq!(runtime.mem_get_info().unwrap().available, before.available);
    }
}
