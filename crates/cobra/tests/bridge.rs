//! The 5-segment bridge construction schedule (Martin Bartusch's 1983 PhD
//! thesis), grounded on
//! `examples/original_source/benchs/sched_bridge_direct_simple.py`. Minimises
//! the makespan (`STOP`'s start time) under seven unary-resource
//! non-overlap constraints expressed as pairwise orderings.

use cobra::{DisjunctionChoice, DisjunctionSide, DisjunctionStaticOrder, IntervalId, Optimizer, SearchMode, SolverConfig, SolverContext};

const HORIZON: i64 = 1_000_000;

struct Bridge {
	ctx: SolverContext,
	stop: IntervalId,
}

fn build() -> Bridge {
	let mut ctx = SolverContext::new();
	let iv = |ctx: &mut SolverContext, name: &str, duration: i64| ctx.new_interval(name, 0, duration, HORIZON).unwrap();

	let start = iv(&mut ctx, "Start", 0);
	let a1 = iv(&mut ctx, "A1", 4);
	let a2 = iv(&mut ctx, "A2", 2);
	let a3 = iv(&mut ctx, "A3", 2);
	let a4 = iv(&mut ctx, "A4", 2);
	let a5 = iv(&mut ctx, "A5", 2);
	let a6 = iv(&mut ctx, "A6", 5);
	let p1 = iv(&mut ctx, "P1", 20);
	let p2 = iv(&mut ctx, "P2", 13);
	let ue = iv(&mut ctx, "UE", 10);
	let s1 = iv(&mut ctx, "S1", 8);
	let s2 = iv(&mut ctx, "S2", 4);
	let s3 = iv(&mut ctx, "S3", 4);
	let s4 = iv(&mut ctx, "S4", 4);
	let s5 = iv(&mut ctx, "S5", 4);
	let s6 = iv(&mut ctx, "S6", 10);
	let b1 = iv(&mut ctx, "B1", 1);
	let b2 = iv(&mut ctx, "B2", 1);
	let b3 = iv(&mut ctx, "B3", 1);
	let b4 = iv(&mut ctx, "B4", 1);
	let b5 = iv(&mut ctx, "B5", 1);
	let b6 = iv(&mut ctx, "B6", 1);
	let ab1 = iv(&mut ctx, "AB1", 1);
	let ab2 = iv(&mut ctx, "AB2", 1);
	let ab3 = iv(&mut ctx, "AB3", 1);
	let ab4 = iv(&mut ctx, "AB4", 1);
	let ab5 = iv(&mut ctx, "AB5", 1);
	let ab6 = iv(&mut ctx, "AB6", 1);
	let m1 = iv(&mut ctx, "M1", 16);
	let m2 = iv(&mut ctx, "M2", 8);
	let m3 = iv(&mut ctx, "M3", 8);
	let m4 = iv(&mut ctx, "M4", 8);
	let m5 = iv(&mut ctx, "M5", 8);
	let m6 = iv(&mut ctx, "M6", 20);
	let l = iv(&mut ctx, "L", 2);
	let t1 = iv(&mut ctx, "T1", 12);
	let t2 = iv(&mut ctx, "T2", 12);
	let t3 = iv(&mut ctx, "T3", 12);
	let t4 = iv(&mut ctx, "T4", 12);
	let t5 = iv(&mut ctx, "T5", 12);
	let ua = iv(&mut ctx, "UA", 10);
	let v1 = iv(&mut ctx, "V1", 15);
	let v2 = iv(&mut ctx, "V2", 10);
	let k1 = iv(&mut ctx, "K1", 0);
	let k2 = iv(&mut ctx, "K2", 0);
	let stop = iv(&mut ctx, "STOP", 0);

	ctx.end_before_start(start, a1, 0).unwrap();
	ctx.end_before_start(start, a2, 0).unwrap();
	ctx.end_before_start(start, a3, 0).unwrap();
	ctx.end_before_start(start, a4, 0).unwrap();
	ctx.end_before_start(start, a5, 0).unwrap();
	ctx.end_before_start(start, a6, 0).unwrap();
	ctx.end_before_start(start, ue, 0).unwrap();

	ctx.end_before_start(a1, s1, 0).unwrap();
	ctx.end_before_start(a2, s2, 0).unwrap();
	ctx.end_before_start(a5, s5, 0).unwrap();
	ctx.end_before_start(a6, s6, 0).unwrap();
	ctx.end_before_start(a3, p1, 0).unwrap();
	ctx.end_before_start(a4, p2, 0).unwrap();

	ctx.end_before_start(p1, s3, 0).unwrap();
	ctx.end_before_start(p2, s4, 0).unwrap();

	ctx.end_before_start(p1, k1, 0).unwrap();
	ctx.end_before_start(p2, k1, 0).unwrap();

	ctx.end_before_start(s1, b1, 0).unwrap();
	ctx.end_before_start(s2, b2, 0).unwrap();
	ctx.end_before_start(s3, b3, 0).unwrap();
	ctx.end_before_start(s4, b4, 0).unwrap();
	ctx.end_before_start(s5, b5, 0).unwrap();
	ctx.end_before_start(s6, b6, 0).unwrap();

	ctx.end_before_start(b1, ab1, 0).unwrap();
	ctx.end_before_start(b2, ab2, 0).unwrap();
	ctx.end_before_start(b3, ab3, 0).unwrap();
	ctx.end_before_start(b4, ab4, 0).unwrap();
	ctx.end_before_start(b5, ab5, 0).unwrap();
	ctx.end_before_start(b6, ab6, 0).unwrap();

	ctx.end_before_start(ab1, m1, 0).unwrap();
	ctx.end_before_start(ab2, m2, 0).unwrap();
	ctx.end_before_start(ab3, m3, 0).unwrap();
	ctx.end_before_start(ab4, m4, 0).unwrap();
	ctx.end_before_start(ab5, m5, 0).unwrap();
	ctx.end_before_start(ab6, m6, 0).unwrap();

	ctx.end_before_start(m1, t1, 0).unwrap();
	ctx.end_before_start(m2, t1, 0).unwrap();
	ctx.end_before_start(m2, t2, 0).unwrap();
	ctx.end_before_start(m3, t2, 0).unwrap();
	ctx.end_before_start(m3, t3, 0).unwrap();
	ctx.end_before_start(m4, t3, 0).unwrap();
	ctx.end_before_start(m4, t4, 0).unwrap();
	ctx.end_before_start(m5, t4, 0).unwrap();
	ctx.end_before_start(m5, t5, 0).unwrap();
	ctx.end_before_start(m6, t5, 0).unwrap();

	ctx.end_before_start(m1, k2, 0).unwrap();
	ctx.end_before_start(m2, k2, 0).unwrap();
	ctx.end_before_start(m3, k2, 0).unwrap();
	ctx.end_before_start(m4, k2, 0).unwrap();
	ctx.end_before_start(m5, k2, 0).unwrap();
	ctx.end_before_start(m6, k2, 0).unwrap();

	ctx.end_before_start(l, t1, 0).unwrap();
	ctx.end_before_start(l, t2, 0).unwrap();
	ctx.end_before_start(l, t3, 0).unwrap();
	ctx.end_before_start(l, t4, 0).unwrap();
	ctx.end_before_start(l, t5, 0).unwrap();

	ctx.end_before_start(t1, v1, 0).unwrap();
	ctx.end_before_start(t5, v2, 0).unwrap();

	ctx.end_before_start(t2, stop, 0).unwrap();
	ctx.end_before_start(t3, stop, 0).unwrap();
	ctx.end_before_start(t4, stop, 0).unwrap();
	ctx.end_before_start(v1, stop, 0).unwrap();
	ctx.end_before_start(v2, stop, 0).unwrap();
	ctx.end_before_start(ua, stop, 0).unwrap();
	ctx.end_before_start(k1, stop, 0).unwrap();
	ctx.end_before_start(k2, stop, 0).unwrap();

	ctx.start_before_end(l, start, -30).unwrap();
	ctx.start_before_end(s1, a1, -3).unwrap();
	ctx.start_before_end(s2, a2, -3).unwrap();
	ctx.start_before_end(s5, a5, -3).unwrap();
	ctx.start_before_end(s6, a6, -3).unwrap();
	ctx.start_before_end(s3, p1, -3).unwrap();
	ctx.start_before_end(s4, p2, -3).unwrap();

	ctx.end_before_end(b6, s6, -4).unwrap();
	ctx.end_before_end(b5, s5, -4).unwrap();
	ctx.end_before_end(b4, s4, -4).unwrap();
	ctx.end_before_end(b3, s3, -4).unwrap();
	ctx.end_before_end(b2, s2, -4).unwrap();
	ctx.end_before_end(b1, s1, -4).unwrap();

	ctx.start_before_start(ue, s1, 6).unwrap();
	ctx.start_before_start(ue, s2, 6).unwrap();
	ctx.start_before_start(ue, s3, 6).unwrap();
	ctx.start_before_start(ue, s4, 6).unwrap();
	ctx.start_before_start(ue, s5, 6).unwrap();
	ctx.start_before_start(ue, s6, 6).unwrap();

	ctx.end_before_start(m1, ua, -2).unwrap();
	ctx.end_before_start(m2, ua, -2).unwrap();
	ctx.end_before_start(m3, ua, -2).unwrap();
	ctx.end_before_start(m4, ua, -2).unwrap();
	ctx.end_before_start(m5, ua, -2).unwrap();
	ctx.end_before_start(m6, ua, -2).unwrap();

	ctx.end_before_start(start, l, 30).unwrap();

	let resources: [&[IntervalId]; 7] = [
		&[t1, t2, t3, t4, t5],
		&[m1, m2, m3, m4, m5, m6],
		&[s1, s2, s3, s4, s5, s6],
		&[a1, a2, a3, a4, a5, a6],
		&[p1, p2],
		&[b1, b2, b3, b4, b5, b6],
		&[v1, v2],
	];
	for tasks in resources {
		for i in 0..tasks.len() {
			for &t2 in &tasks[i + 1..] {
				let t1 = tasks[i];
				let (v1, d1) = { let iv = &ctx.intervals()[t2]; (iv.start, iv.duration) };
				let (v2, d2) = { let iv = &ctx.intervals()[t1]; (iv.start, iv.duration) };
				ctx.ordering(v1, d1, v2, d2).unwrap();
			}
		}
	}

	Bridge { ctx, stop }
}

#[test]
fn bridge_schedule_minimises_to_the_documented_makespan() {
	let mut bridge = build();
	let stop_start = bridge.ctx.intervals()[bridge.stop].start;
	let config = SolverConfig::new(SearchMode::Disjunctive)
		.with_objective(stop_start, true)
		.with_disj_static(DisjunctionStaticOrder::Earliest)
		.with_disj_choice(DisjunctionChoice::MaxWeight)
		.with_disj_side(DisjunctionSide::Declaration);
	let mut opt = Optimizer::new(&bridge.ctx, config);
	let solution = opt.optimize(&mut bridge.ctx, None).unwrap();

	assert_eq!(solution.objective_value, Some(104));
	assert_eq!(solution.backtracks, 586);
	assert_eq!(solution.proof_backtracks, 578);
	assert!(solution.completion);
}
