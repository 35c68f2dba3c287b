use criterion::{criterion_group, criterion_main, Criterion};
use flatgen::{ElementsOf, Fault, Gen, Op, Routine, Wake};

fn yield_throughput(c: &mut Criterion) {
    c.bench_function("yield_10k", |b| {
        b.iter(|| {
            let g: Gen<usize> = Gen::new({
                let mut i = 0usize;
                move |_: Wake| {
                    if i < 10_000 {
                        i += 1;
                        Ok(Op::Yield(i - 1))
                    } else {
                        Ok(Op::Complete)
                    }
                }
            });
            let sum: usize = g.sum();
            assert_eq!(sum, 49_995_000);
        })
    });
}

struct Countdown {
    depth: i32,
    pc: u8,
}

impl Routine<'static, i32> for Countdown {
    fn resume(&mut self, _wake: Wake) -> Result<Op<'static, i32>, Fault> {
        self.pc += 1;
        match self.pc {
            1 => Ok(Op::Yield(self.depth)),
            2 if self.depth > 0 => Ok(Op::Delegate(ElementsOf::nested(Gen::new(Countdown {
                depth: self.depth - 1,
                pc: 0,
            })))),
            3 if self.depth > 0 => Ok(Op::Yield(-self.depth)),
            _ => Ok(Op::Complete),
        }
    }
}

fn nested_delegation(c: &mut Criterion) {
    c.bench_function("delegate_depth_64", |b| {
        b.iter(|| {
            let g: Gen<i32> = Gen::new(Countdown { depth: 64, pc: 0 });
            let sum: i32 = g.sum();
            assert_eq!(sum, 0);
        })
    });
}

criterion_group!(benches, yield_throughput, nested_delegation);
criterion_main!(benches);
