use super::{FileIo, SimState};
use crate::base::Layout;
use crate::StrError;
use gemlab::mesh::Mesh;
use std::fmt::Write;
use std::fs::File;
use std::io::Write as IoWrite;

/// Writes the mesh geometry part shared by all VTU files
fn write_geometry(buffer: &mut String, mesh: &Mesh) -> Result<(), StrError> {
    let ndim = mesh.ndim;
    let npoint = mesh.points.len();
    let ncell = mesh.cells.len();
    if ncell < 1 {
        return Err("there are no cells to write");
    }

    // header
    write!(
        buffer,
        "<?xml version=\"1.0\"?>\n\
         <VTKFile type=\"UnstructuredGrid\" version=\"0.1\" byte_order=\"LittleEndian\">\n\
         <UnstructuredGrid>\n\
         <Piece NumberOfPoints=\"{}\" NumberOfCells=\"{}\">\n",
        npoint, ncell
    )
    .unwrap();

    // nodes: coordinates
    write!(
        buffer,
        "<Points>\n\
         <DataArray type=\"Float64\" NumberOfComponents=\"3\" format=\"ascii\">\n",
    )
    .unwrap();
    for index in 0..npoint {
        for dim in 0..ndim {
            write!(buffer, "{:?} ", mesh.points[index].coords[dim]).unwrap();
        }
        if ndim == 2 {
            write!(buffer, "0.0 ").unwrap();
        }
    }
    write!(
        buffer,
        "\n</DataArray>\n\
         </Points>\n"
    )
    .unwrap();

    // elements: connectivity
    write!(
        buffer,
        "<Cells>\n\
         <DataArray type=\"Int32\" Name=\"connectivity\" format=\"ascii\">\n"
    )
    .unwrap();
    for cell in &mesh.cells {
        if cell.kind.vtk_type().is_none() {
            return Err("cannot generate VTU file because VTK cell type is not available");
        }
        for p in &cell.points {
            write!(buffer, "{} ", p).unwrap();
        }
    }

    // elements: offsets
    write!(
        buffer,
        "\n</DataArray>\n\
         <DataArray type=\"Int32\" Name=\"offsets\" format=\"ascii\">\n"
    )
    .unwrap();
    let mut offset = 0;
    for cell in &mesh.cells {
        offset += cell.points.len();
        write!(buffer, "{} ", offset).unwrap();
    }

    // elements: types
    write!(
        buffer,
        "\n</DataArray>\n\
         <DataArray type=\"UInt8\" Name=\"types\" format=\"ascii\">\n"
    )
    .unwrap();
    for cell in &mesh.cells {
        if let Some(vtk) = cell.kind.vtk_type() {
            write!(buffer, "{} ", vtk).unwrap();
        }
    }
    write!(
        buffer,
        "\n</DataArray>\n\
         </Cells>\n"
    )
    .unwrap();
    Ok(())
}

impl FileIo {
    /// Writes a VTU file with the fluid velocity and pressure at a time station
    pub fn write_vtu_fluid(
        &self,
        fluid: &Mesh,
        layout: &Layout,
        state: &SimState,
        index: usize,
    ) -> Result<(), StrError> {
        if !self.enabled() {
            return Err("FileIo must be enabled first");
        }
        let ndim = fluid.ndim;
        let mut buffer = String::new();
        write_geometry(&mut buffer, fluid)?;

        // data: points
        write!(&mut buffer, "<PointData Scalars=\"TheScalars\">\n").unwrap();
        write!(
            &mut buffer,
            "<DataArray type=\"Float64\" Name=\"velocity\" NumberOfComponents=\"3\" format=\"ascii\">\n"
        )
        .unwrap();
        for point in &fluid.points {
            for c in 0..ndim {
                write!(&mut buffer, "{:?} ", state.xi[layout.velocity_eq(point.id, c)]).unwrap();
            }
            if ndim == 2 {
                write!(&mut buffer, "0.0 ").unwrap();
            }
        }
        write!(&mut buffer, "\n</DataArray>\n").unwrap();
        write!(
            &mut buffer,
            "<DataArray type=\"Float64\" Name=\"pressure\" NumberOfComponents=\"1\" format=\"ascii\">\n"
        )
        .unwrap();
        for point in &fluid.points {
            write!(&mut buffer, "{:?} ", state.xi[layout.pressure_eq(point.id)]).unwrap();
        }
        write!(&mut buffer, "\n</DataArray>\n").unwrap();
        write!(&mut buffer, "</PointData>\n").unwrap();

        // footer
        write!(
            &mut buffer,
            "</Piece>\n\
             </UnstructuredGrid>\n\
             </VTKFile>\n"
        )
        .unwrap();

        // write file
        let path = self.path_vtu("fluid", index);
        let mut file = File::create(&path).map_err(|_| "cannot create VTU file")?;
        file.write_all(buffer.as_bytes()).map_err(|_| "cannot write VTU file")?;
        Ok(())
    }

    /// Writes a VTU file with the solid displacement at a time station
    pub fn write_vtu_solid(
        &self,
        solid: &Mesh,
        layout: &Layout,
        state: &SimState,
        index: usize,
    ) -> Result<(), StrError> {
        if !self.enabled() {
            return Err("FileIo must be enabled first");
        }
        let ndim = solid.ndim;
        let mut buffer = String::new();
        write_geometry(&mut buffer, solid)?;

        // data: points
        write!(&mut buffer, "<PointData Scalars=\"TheScalars\">\n").unwrap();
        write!(
            &mut buffer,
            "<DataArray type=\"Float64\" Name=\"displacement\" NumberOfComponents=\"3\" format=\"ascii\">\n"
        )
        .unwrap();
        for point in &solid.points {
            for c in 0..ndim {
                write!(&mut buffer, "{:?} ", state.xi[layout.solid_eq(point.id, c)]).unwrap();
            }
            if ndim == 2 {
                write!(&mut buffer, "0.0 ").unwrap();
            }
        }
        write!(&mut buffer, "\n</DataArray>\n").unwrap();
        write!(&mut buffer, "</PointData>\n").unwrap();

        // footer
        write!(
            &mut buffer,
            "</Piece>\n\
             </UnstructuredGrid>\n\
             </VTKFile>\n"
        )
        .unwrap();

        // write file
        let path = self.path_vtu("solid", index);
        let mut file = File::create(&path).map_err(|_| "cannot create VTU file")?;
        file.write_all(buffer.as_bytes()).map_err(|_| "cannot write VTU file")?;
        Ok(())
    }

    /// Writes a summary file for all time stations to perform visualization with ParaView
    pub fn write_pvd(&self, which: &str) -> Result<(), StrError> {
        if !self.enabled() {
            return Err("FileIo must be enabled first");
        }

        // header
        let mut buffer = String::new();
        write!(&mut buffer, "<?xml version=\"1.0\"?>\n<VTKFile type=\"Collection\" version=\"0.1\" byte_order=\"LittleEndian\">\n<Collection>\n").unwrap();

        // add VTU entries to PVD file
        for (position, index) in self.indices.iter().enumerate() {
            let vtu_fn = self.path_vtu(which, *index);
            write!(
                &mut buffer,
                "<DataSet timestep=\"{:?}\" file=\"{}\" />\n",
                self.times[position], vtu_fn
            )
            .unwrap();
        }

        // footer
        write!(&mut buffer, "</Collection>\n</VTKFile>\n").unwrap();

        // write file
        let path = self.path_pvd(which);
        let mut file = File::create(&path).map_err(|_| "cannot create PVD file")?;
        file.write_all(buffer.as_bytes()).map_err(|_| "cannot write PVD file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
