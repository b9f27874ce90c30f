
use benchmarking::BenchmarkError;
use stride_table::{KeyedTable, MemberSet};
use tracing::Level;

const CAPACITY: usize = 1 << 10;
const SAMPLE_SIZE: usize = 100000;

fn main() -> Result<(), BenchmarkError> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let samples: Vec<usize> = (0..SAMPLE_SIZE).map(|_| rand::random::<usize>()).collect();
    let keys: Vec<String> = samples.iter().map(|sample| format!("{sample:x}")).collect();

    let mut set: MemberSet = MemberSet::with_capacity(CAPACITY);
    set.extend(samples.iter().copied());
    tracing::info!(
        capacity = set.capacity(),
        count = set.len(),
        load_factor = set.load_factor(),
        "member set filled"
    );

    let mut table: KeyedTable<usize> = KeyedTable::with_capacity(CAPACITY);
    table.extend(keys.iter().map(String::as_str).zip(samples.iter().copied()));
    tracing::info!(
        capacity = table.capacity(),
        count = table.len(),
        load_factor = table.load_factor(),
        "keyed table filled"
    );

    benchmarking::warm_up();

    let owned: Vec<usize> = samples.clone();
    let result = benchmarking::measure_function(move |measurer| {
        let mut set: MemberSet = MemberSet::with_capacity(CAPACITY);
        measurer.measure(|| {
            for sample in &owned {
                set.add(*sample);
            }
        });
    })?;
    tracing::info!("set insert of {} samples takes {:?}", SAMPLE_SIZE, result.elapsed());

    let owned: Vec<usize> = samples.clone();
    let result = benchmarking::measure_function(move |measurer| {
        let set: MemberSet = owned.iter().copied().collect();
        measurer.measure(|| {
            for sample in &owned {
                if !set.has(*sample) {
                    panic!("Failed to find member {}", sample);
                }
            }
        });
    })?;
    tracing::info!("set lookup of {} samples takes {:?}", SAMPLE_SIZE, result.elapsed());

    let owned: Vec<String> = keys.clone();
    let result = benchmarking::measure_function(move |measurer| {
        let mut table: KeyedTable<usize> = KeyedTable::with_capacity(CAPACITY);
        measurer.measure(|| {
            for (i, key) in owned.iter().enumerate() {
                table.set(key, i);
            }
        });
    })?;
    tracing::info!("table insert of {} keys takes {:?}", SAMPLE_SIZE, result.elapsed());

    let owned: Vec<String> = keys.clone();
    let result = benchmarking::measure_function(move |measurer| {
        let table: KeyedTable<usize> = owned
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();
        measurer.measure(|| {
            for key in &owned {
                if table.get(key).is_none() {
                    panic!("Failed to get key {}", key);
                }
            }
        });
    })?;
    tracing::info!("table lookup of {} keys takes {:?}", SAMPLE_SIZE, result.elapsed());

    let owned: Vec<String> = keys.clone();
    let result = benchmarking::measure_function(move |measurer| {
        let mut table: KeyedTable<usize> = owned
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();
        measurer.measure(|| {
            for key in &owned {
                table.remove(key);
            }
        });
    })?;
    tracing::info!("table remove of {} keys takes {:?}", SAMPLE_SIZE, result.elapsed());

    Ok(())
}
