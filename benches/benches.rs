use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::LinkedList;
use std::iter;
use unrolled_list::UnrolledList;

const ITERATE_LEN: usize = 100_000;

const RANDOM_ACCESS_LEN: usize = 2usize.pow(14);
const RANDOM_ACCESS_STRIDE: usize = 1001;

const BUILD_LIST_LEN: usize = 100_000;

const POP_MANY_LEN: usize = 100_000;

const ERASE_LEN: usize = 10_000;

fn iterate_list_iter(c: &mut Criterion) {
    c.bench_function("iterate_iter", |b| {
        let list = UnrolledList::from_iter(0..ITERATE_LEN);

        b.iter(|| {
            let list = black_box(&list);

            for x in list.iter() {
                black_box(*x);
            }
        });
    });
}

fn iterate_list_cursor(c: &mut Criterion) {
    c.bench_function("iterate_cursor", |b| {
        let list = UnrolledList::from_iter(0..ITERATE_LEN);

        b.iter(|| {
            let list = black_box(&list);
            let mut cursor = list.begin();

            while let Some(x) = cursor.get(list) {
                black_box(*x);
                cursor.move_next(list);
            }
        });
    });
}

fn iterate_linked_list(c: &mut Criterion) {
    c.bench_function("iterate_linked_list", |b| {
        let list = LinkedList::from_iter(0..ITERATE_LEN);

        b.iter(|| {
            let list = black_box(&list);

            for x in list.iter() {
                black_box(*x);
            }
        });
    });
}

fn iterate_vec(c: &mut Criterion) {
    c.bench_function("iterate_vec", |b| {
        let list = Vec::from_iter(0..ITERATE_LEN);

        b.iter(|| {
            let list = black_box(&list);

            for x in list.iter() {
                black_box(*x);
            }
        });
    });
}

fn random_access_list(c: &mut Criterion) {
    c.bench_function("random_access_list", |b| {
        let list = UnrolledList::from_iter(0..RANDOM_ACCESS_LEN);

        b.iter(|| {
            let mut index = RANDOM_ACCESS_STRIDE;

            while index != 0 {
                let list = black_box(&list);
                black_box(list[black_box(index)]);
                index = (index + RANDOM_ACCESS_STRIDE) % RANDOM_ACCESS_LEN;
            }
        })
    });
}

fn random_access_vec(c: &mut Criterion) {
    c.bench_function("random_access_vec", |b| {
        let list = Vec::from_iter(0..RANDOM_ACCESS_LEN);

        b.iter(|| {
            let mut index = RANDOM_ACCESS_STRIDE;

            while index != 0 {
                let list = black_box(&list);
                black_box(list[black_box(index)]);
                index = (index + RANDOM_ACCESS_STRIDE) % RANDOM_ACCESS_LEN;
            }
        })
    });
}

fn build_list_push(c: &mut Criterion) {
    c.bench_function("build_list_push", |b| {
        b.iter(|| {
            let mut list = UnrolledList::new();

            let mut iter = 0..BUILD_LIST_LEN;
            while let Some(i) = black_box(iter.next()) {
                list.push_back(i);
            }

            black_box(list)
        })
    });
}

fn build_linked_list_push(c: &mut Criterion) {
    c.bench_function("build_linked_list_push", |b| {
        b.iter(|| {
            let mut list = LinkedList::new();

            let mut iter = 0..BUILD_LIST_LEN;
            while let Some(i) = black_box(iter.next()) {
                list.push_back(i);
            }

            black_box(list)
        })
    });
}

fn build_list_extend(c: &mut Criterion) {
    c.bench_function("build_list_extend", |b| {
        b.iter(|| {
            let mut list = UnrolledList::new();
            let iter = (0..BUILD_LIST_LEN).map(black_box);
            list.extend(iter);
            black_box(list)
        })
    });
}

fn build_list_extend_zeros(c: &mut Criterion) {
    c.bench_function("build_list_extend_zeros", |b| {
        b.iter(|| {
            let mut list = UnrolledList::new();
            list.extend(iter::repeat(0usize).take(BUILD_LIST_LEN));
            black_box(list)
        })
    });
}

fn build_list_reuse(c: &mut Criterion) {
    c.bench_function("build_list_reuse", |b| {
        let mut list = UnrolledList::from_iter(0..BUILD_LIST_LEN);

        b.iter(|| {
            list.clear();
            list.extend((0..BUILD_LIST_LEN).map(black_box));
            black_box(&list);
        })
    });
}

fn pop_many_list(c: &mut Criterion) {
    c.bench_function("pop_many_list", |b| {
        b.iter_batched(
            || UnrolledList::from_iter(0..POP_MANY_LEN),
            |list| {
                let mut list = black_box(list);
                while black_box(list.pop_back()).is_some() {}
            },
            BatchSize::LargeInput,
        )
    });
}

fn pop_many_linked_list(c: &mut Criterion) {
    c.bench_function("pop_many_linked_list", |b| {
        b.iter_batched(
            || LinkedList::from_iter(0..POP_MANY_LEN),
            |list| {
                let mut list = black_box(list);
                while black_box(list.pop_back()).is_some() {}
            },
            BatchSize::LargeInput,
        )
    });
}

fn erase_front_list(c: &mut Criterion) {
    c.bench_function("erase_front_list", |b| {
        b.iter_batched(
            || UnrolledList::from_iter(0..ERASE_LEN),
            |mut list| {
                while !list.is_empty() {
                    black_box(list.erase(list.begin()));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

fn erase_front_vec(c: &mut Criterion) {
    c.bench_function("erase_front_vec", |b| {
        b.iter_batched(
            || Vec::from_iter(0..ERASE_LEN),
            |mut list| {
                while !list.is_empty() {
                    black_box(list.remove(0));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

fn find_list(c: &mut Criterion) {
    c.bench_function("find_list", |b| {
        let list = UnrolledList::from_iter(0..ITERATE_LEN);

        b.iter(|| black_box(&list).find(black_box(&(ITERATE_LEN - 1))))
    });
}

fn assign_list(c: &mut Criterion) {
    c.bench_function("assign_list", |b| {
        let source = UnrolledList::from_iter(0..ITERATE_LEN);
        let mut dest = UnrolledList::from_iter(0..ITERATE_LEN / 2);

        b.iter(|| {
            dest.assign(black_box(&source));
            black_box(&dest);
        })
    });
}

criterion_group!(
    iterate,
    iterate_list_iter,
    iterate_list_cursor,
    iterate_linked_list,
    iterate_vec
);

criterion_group!(random_access, random_access_list, random_access_vec);

criterion_group!(
    build,
    build_list_push,
    build_linked_list_push,
    build_list_extend,
    build_list_extend_zeros,
    build_list_reuse,
);

criterion_group!(pop_many, pop_many_list, pop_many_linked_list);

criterion_group!(erase, erase_front_list, erase_front_vec);

criterion_group!(search, find_list, assign_list);

criterion_main!(iterate, random_access, build, pop_many, erase, search);
