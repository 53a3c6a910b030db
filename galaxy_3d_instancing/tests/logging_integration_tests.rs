//! Integration tests for Engine logging system
//!
//! These tests verify the logging system and the log output of the
//! culling pipeline.
//!
//! Run with: cargo test --test logging_integration_tests

use galaxy_3d_instancing::galaxy3d::Engine;
use galaxy_3d_instancing::galaxy3d::log::{Logger, LogEntry, LogSeverity};
use galaxy_3d_instancing::galaxy3d::bounds::AABB;
use galaxy_3d_instancing::galaxy3d::bvh::{BvhItem, InstanceBvh};
use galaxy_3d_instancing::galaxy3d::config::{BvhConfig, InstancedMeshConfig};
use galaxy_3d_instancing::galaxy3d::instancing::{ActiveSet, InstanceGeometry, InstanceId, InstancedMesh};
use galaxy_3d_instancing::glam::{Mat4, Vec3};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn entries_from(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.source == source)
        .cloned()
        .collect()
}

fn unit_geometry() -> InstanceGeometry {
    InstanceGeometry::from_aabb(AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5)))
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Engine::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    let captured = entries_from(&entries, "test::module");
    assert_eq!(captured.len(), 3);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "Test info message");
    assert_eq!(captured[1].severity, LogSeverity::Warn);
    assert_eq!(captured[2].severity, LogSeverity::Error);
    assert_eq!(captured[2].message, "Test error message");

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    let captured = entries_from(&entries, "test::error");
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].file, Some("test_file.rs"));
    assert_eq!(captured[0].line, Some(42));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::reset", "Message 1".to_string());
    assert_eq!(entries_from(&entries, "test::reset").len(), 1);

    Engine::reset_logger();

    // Goes to the default logger, not captured
    Engine::log(LogSeverity::Info, "test::reset", "Message 2".to_string());
    assert_eq!(entries_from(&entries, "test::reset").len(), 1);
}

#[test]
#[serial]
fn test_integration_severity_filter() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    // Default filter drops Trace and Debug
    Engine::log(LogSeverity::Trace, "test::filter", "Trace message".to_string());
    Engine::log(LogSeverity::Debug, "test::filter", "Debug message".to_string());
    Engine::log(LogSeverity::Info, "test::filter", "Info message".to_string());
    assert_eq!(entries_from(&entries, "test::filter").len(), 1);

    Engine::set_min_severity(LogSeverity::Trace);
    Engine::log(LogSeverity::Trace, "test::filter", "Trace message".to_string());
    assert_eq!(entries_from(&entries, "test::filter").len(), 2);

    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Info);
}

// ============================================================================
// PIPELINE LOG OUTPUT
// ============================================================================

#[test]
#[serial]
fn test_integration_mesh_creation_is_logged() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    InstancedMesh::new(InstancedMeshConfig::default(), unit_geometry(), 12, |_, _| {}).unwrap();

    let captured = entries_from(&entries, "galaxy3d::InstancedMesh");
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert!(captured[0].message.contains("12 instances"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_culling_trace_when_enabled() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);
    Engine::set_min_severity(LogSeverity::Trace);

    let mut mesh = InstancedMesh::new(InstancedMeshConfig::default(), unit_geometry(), 4, |_, _| {}).unwrap();
    mesh.update_culling(&Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, -5.0, 5.0)).unwrap();

    let traces: Vec<_> = entries_from(&entries, "galaxy3d::InstancedMesh")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Trace)
        .collect();
    assert_eq!(traces.len(), 1);
    assert!(traces[0].message.contains("4/4 drawn"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_contract_violation_logs_error_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mut set = ActiveSet::new(4, 2).unwrap();
    assert!(set.reconcile(&[InstanceId(3)], &[InstanceId(3)]).is_err());

    let captured = entries_from(&entries, "galaxy3d::ActiveSet");
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_degenerate_bvh_warns() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let items: Vec<BvhItem> = (0..30)
        .map(|i| BvhItem {
            id: InstanceId(i),
            aabb: AABB::new(Vec3::ZERO, Vec3::ONE),
            position: Vec3::splat(0.5),
        })
        .collect();
    let config = BvhConfig { leaf_capacity: 4, ..BvhConfig::default() };
    InstanceBvh::build(&items, &config).unwrap();

    let warnings: Vec<_> = entries_from(&entries, "galaxy3d::Bvh")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Warn)
        .collect();
    assert_eq!(warnings.len(), 1);

    Engine::reset_logger();
}
