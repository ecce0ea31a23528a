//! Route computation and marker animation over synthetic routes.

mod fixtures;

use std::sync::atomic::Ordering;
use std::time::Duration;

use focus_route::animator::{AnimationPhase, ProgressAnimator, pose_at_progress, position_at_progress};
use focus_route::geo::{GeoPoint, haversine_distance};
use focus_route::journey::{RouteSession, SessionOptions, Stopover};
use focus_route::map_view::{MapIntent, MapViewState};
use focus_route::route::MAX_WAYPOINTS;
use focus_route::speed::total_duration;

use fixtures::{
    FailingOracle, FailingSpeedLimits, FixedOracle, MONTEREY_WHARF, SAN_JOSE_DIRIDON,
    ScriptedOracle, SplitSpeedLimits, build_route,
};

fn close(a: GeoPoint, b: GeoPoint, meters: f64) -> bool {
    haversine_distance(a, b) < meters
}

#[test]
fn test_computed_route_has_aligned_tables() {
    let origin = SAN_JOSE_DIRIDON.point();
    let destination = MONTEREY_WHARF.point();
    let oracle = ScriptedOracle::new(4200.0);
    let mut session = RouteSession::default();

    let route = session
        .compute(&oracle, None, origin, destination, Vec::new())
        .expect("route computed");

    assert_eq!(route.distances.len(), route.polyline.len());
    assert_eq!(route.distances[0], 0.0);
    assert!(route.distances.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(route.time_points[0].elapsed, 0.0);
    assert!(route.time_points.windows(2).all(|w| w[1].elapsed >= w[0].elapsed));

    let segments = route.speed_segments.as_ref().expect("step speed segments");
    assert!((total_duration(segments) - 4200.0).abs() < 1.0);
    assert_eq!(segments.last().unwrap().end_distance, route.total_distance());
    assert!(session.route().is_some());
}

#[test]
fn test_stopovers_get_time_percentages_from_legs() {
    let origin = GeoPoint::new(38.0, -122.0);
    let stop = GeoPoint::new(37.5, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let oracle = FixedOracle(build_route(&[origin, stop, destination], &[3000.0, 1000.0], 4));
    let mut session = RouteSession::default();

    let route = session
        .compute(&oracle, None, origin, destination, vec![Stopover::new(stop)])
        .unwrap();

    assert_eq!(route.stopovers.len(), 1);
    assert!((route.stopovers[0].time_percentage - 75.0).abs() < 1e-9);
}

#[test]
fn test_failed_recompute_clears_previous_route() {
    let origin = SAN_JOSE_DIRIDON.point();
    let destination = MONTEREY_WHARF.point();
    let mut session = RouteSession::default();

    assert!(session
        .compute(&ScriptedOracle::new(4200.0), None, origin, destination, Vec::new())
        .is_some());
    let stale = session.route().unwrap();

    assert!(session
        .compute(&FailingOracle, None, origin, destination, Vec::new())
        .is_none());
    assert!(session.route().is_none());
    // Snapshots already handed out stay intact.
    assert!(!stale.polyline.is_empty());
}

#[test]
fn test_excess_stopovers_are_dropped() {
    let origin = GeoPoint::new(38.0, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let stopovers: Vec<Stopover> = (1..=30)
        .map(|i| Stopover::new(GeoPoint::new(38.0 - i as f64 / 31.0, -122.0)))
        .collect();
    let oracle = ScriptedOracle::new(30_000.0);
    let mut session = RouteSession::default();

    let route = session
        .compute(&oracle, None, origin, destination, stopovers)
        .unwrap();

    assert_eq!(oracle.requests.borrow()[0].intermediates.len(), MAX_WAYPOINTS);
    assert_eq!(route.stopovers.len(), MAX_WAYPOINTS);
}

#[test]
fn test_speed_limits_are_only_used_when_enabled() {
    let origin = GeoPoint::new(38.0, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let oracle = ScriptedOracle::new(3600.0);
    let limits = SplitSpeedLimits::new(37.5);

    let mut disabled = RouteSession::default();
    disabled.compute(&oracle, Some(&limits), origin, destination, Vec::new());
    assert_eq!(limits.calls.load(Ordering::SeqCst), 0);

    let mut enabled = RouteSession::new(SessionOptions {
        use_speed_limits: true,
    });
    let route = enabled
        .compute(&oracle, Some(&limits), origin, destination, Vec::new())
        .unwrap();
    assert_eq!(limits.calls.load(Ordering::SeqCst), 1);

    let segments = route.speed_segments.as_ref().unwrap();
    assert!((total_duration(segments) - 3600.0).abs() < 1e-6);
    // Slow northern half takes three quarters of the time.
    let halfway = position_at_progress(&route, 0.75).unwrap();
    assert!(close(halfway, GeoPoint::new(37.5, -122.0), 1500.0), "got {:?}", halfway);
}

#[test]
fn test_failed_speed_limits_fall_back_to_step_timing() {
    let origin = GeoPoint::new(38.0, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let oracle = ScriptedOracle::new(3600.0);

    let mut plain = RouteSession::default();
    let expected = plain
        .compute(&oracle, None, origin, destination, Vec::new())
        .unwrap();

    let mut enabled = RouteSession::new(SessionOptions {
        use_speed_limits: true,
    });
    let route = enabled
        .compute(&oracle, Some(&FailingSpeedLimits), origin, destination, Vec::new())
        .expect("route survives a speed-limit failure");

    assert!(route.speed_segments.is_some());
    assert_eq!(route.speed_segments, expected.speed_segments);
}

#[test]
fn test_marker_moves_faster_on_faster_legs() {
    let origin = GeoPoint::new(38.0, -122.0);
    let middle = GeoPoint::new(37.5, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let oracle = FixedOracle(build_route(&[origin, middle, destination], &[600.0, 1800.0], 5));
    let mut session = RouteSession::default();
    let route = session
        .compute(&oracle, None, origin, destination, vec![Stopover::new(middle)])
        .unwrap();

    assert!(close(position_at_progress(&route, 0.0).unwrap(), origin, 1.0));
    assert!(close(position_at_progress(&route, 0.25).unwrap(), middle, 100.0));
    assert!(close(position_at_progress(&route, 1.0).unwrap(), destination, 1.0));

    let pose = pose_at_progress(&route, 0.5).unwrap();
    assert!((pose.heading - 180.0).abs() < 0.5, "heading {}", pose.heading);
    let end = pose_at_progress(&route, 1.0).unwrap();
    assert!((end.heading - 180.0).abs() < 0.5, "heading {}", end.heading);
}

#[test]
fn test_animator_drives_marker_and_camera() {
    let origin = GeoPoint::new(38.0, -122.0);
    let destination = GeoPoint::new(37.0, -122.0);
    let mut session = RouteSession::default();
    let route = session
        .compute(&ScriptedOracle::new(3600.0), None, origin, destination, Vec::new())
        .unwrap();

    let mut animator = ProgressAnimator::default();
    assert!(animator.marker(&route, Duration::ZERO).is_none());

    let token = animator.set_target(0.5, Duration::from_secs(10));
    assert_eq!(animator.phase(), AnimationPhase::Animating);
    let mut view = MapViewState::default().reduce(MapIntent::Follow);

    let mut previous_lat = f64::MAX;
    for frame in 0..=60 {
        let now = Duration::from_secs(10) + Duration::from_millis(frame * 1000 / 60);
        assert!(animator.is_current(token));
        let pose = animator.marker(&route, now).unwrap();
        assert!(pose.position.lat <= previous_lat);
        previous_lat = pose.position.lat;
        view = view.reduce(MapIntent::MarkerMoved(pose));
    }

    assert!(close(view.center, GeoPoint::new(37.5, -122.0), 100.0));
    assert!((view.heading - 180.0).abs() < 0.5);

    animator.reset();
    assert!(!animator.is_current(token));
    assert!(animator.marker(&route, Duration::from_secs(20)).is_none());
}
