use std::fs::File;
use std::io::Write;
use std::path::Path;

use arrow::array::Array;
use arrow::ipc::reader::FileReader;
use pgarrow_result::Result;

/// Print the schema of an Arrow file and a row/null summary of each batch.
pub fn dump_arrow_file<O: Write>(path: &Path, out: &mut O) -> Result<()> {
    let reader = FileReader::try_new(File::open(path)?, None)?;
    let schema = reader.schema();
    writeln!(out, "file: {}", path.display())?;
    writeln!(out, "schema: {} fields, {} batches", schema.fields().len(), reader.num_batches())?;
    for (idx, field) in schema.fields().iter().enumerate() {
        writeln!(out, "  field[{idx}] {}: {}", field.name(), field.data_type())?;
        let mut metadata: Vec<_> = field.metadata().iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            writeln!(out, "    {key} = {value}")?;
        }
    }
    for (idx, batch) in reader.enumerate() {
        let batch = batch?;
        let nulls: Vec<String> = batch
            .columns()
            .iter()
            .map(|c| c.null_count().to_string())
            .collect();
        writeln!(
            out,
            "batch[{idx}]: rows={}, nulls=[{}]",
            batch.num_rows(),
            nulls.join(", ")
        )?;
    }
    Ok(())
}
