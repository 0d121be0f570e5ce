use gemlab::mesh::Mesh;
use ifem::base::Layout;
use ifem::fem::{FileIo, SimState};
use ifem::StrError;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "ifem_to_paraview",
    about = "Generates VTU and PVD files for visualization with Paraview"
)]
struct Options {
    out_dir: String,

    fn_stem: String,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();

    // load summary and meshes
    let path_summary = format!("{}/{}-summary.json", options.out_dir, options.fn_stem);
    let file_io = FileIo::read_json(&path_summary)?;
    let fluid = Mesh::read_json(&file_io.path_mesh("fluid"))?;
    let solid = Mesh::read_json(&file_io.path_mesh("solid"))?;
    let layout = Layout::new(&fluid, &solid)?;

    // write VTU files
    for index in &file_io.indices {
        let state = SimState::read_json(&file_io.path_state(*index))?;
        file_io.write_vtu_fluid(&fluid, &layout, &state, *index)?;
        file_io.write_vtu_solid(&solid, &layout, &state, *index)?;
    }

    // write PVD files
    file_io.write_pvd("fluid")?;
    file_io.write_pvd("solid")?;

    // message
    let path_pvd = file_io.path_pvd("fluid");
    let thin_line = format!("{:─^1$}", "", path_pvd.len());
    println!("\n\n{}", thin_line);
    println!("VTU files generated; the PVD files are:");
    println!("{}", file_io.path_pvd("fluid"));
    println!("{}", file_io.path_pvd("solid"));
    println!("{}\n\n", thin_line);
    Ok(())
}
